// Copyright (c) 2023 Bolt Labs Holdings, Inc
//
// This source code is licensed under both the MIT license found in the
// LICENSE-MIT file in the root directory of this source tree and the Apache
// License, Version 2.0 found in the LICENSE-APACHE file in the root directory
// of this source tree.

//! Benchmarks for the three hot operations of a signing session: one
//! signer's partial signature, aggregation, and verification.

use criterion::{criterion_group, criterion_main, BatchSize, Criterion};
use rand::rngs::OsRng;
use tss_schnorr::{aggregate, generate_moduli, Batch, CrtSharing, ShareParams, Signer};

const MESSAGE: &str = "Hello World";

struct Fixture {
    sharing: CrtSharing,
    packets: Vec<ShareParams>,
}

fn fixture() -> Fixture {
    let mut rng = OsRng;
    let moduli = generate_moduli(&[256], 5, &mut rng).expect("moduli generation");
    let sharing = CrtSharing::new(5, 2, moduli, &mut rng).expect("dealer setup");
    let packets = sharing.share_packets();
    Fixture { sharing, packets }
}

fn bench_sign(c: &mut Criterion) {
    let Fixture { sharing, packets } = fixture();
    let count = sharing.signing_threshold();

    // The other participants' commitments stay fixed; each iteration arms
    // a fresh copy of the measured signer, because nonce pairs are
    // single-use.
    let fixed: Vec<_> = packets[1..count]
        .iter()
        .map(|packet| {
            Signer::from_share_params(packet.clone())
                .commit(&mut OsRng)
                .batch_item()
        })
        .collect();

    c.bench_function("partial_sign", |b| {
        b.iter_batched(
            || {
                let mut signer = Signer::from_share_params(packets[0].clone());
                let mut items = fixed.clone();
                items.push(signer.commit(&mut OsRng).batch_item());
                (signer, Batch::new(items).expect("batch"))
            },
            |(mut signer, batch)| signer.sign(MESSAGE, &batch).expect("partial signature"),
            BatchSize::SmallInput,
        )
    });
}

fn bench_aggregate_and_verify(c: &mut Criterion) {
    let Fixture { sharing, packets } = fixture();
    let count = sharing.signing_threshold();

    let mut signers: Vec<Signer> = packets[..count]
        .iter()
        .map(|packet| Signer::from_share_params(packet.clone()))
        .collect();
    let items = signers
        .iter_mut()
        .map(|signer| signer.commit(&mut OsRng).batch_item())
        .collect();
    let batch = Batch::new(items).expect("batch");
    let partials: Vec<_> = signers
        .iter_mut()
        .map(|signer| signer.sign(MESSAGE, &batch).expect("partial signature"))
        .collect();
    let product = batch.product();

    c.bench_function("aggregate", |b| {
        b.iter(|| aggregate(&partials, &product).expect("aggregate"))
    });

    let signature = aggregate(&partials, &product).expect("aggregate");
    let public_key = sharing.public_key();
    assert!(signature.verify(MESSAGE, &public_key));

    c.bench_function("verify", |b| {
        b.iter(|| signature.verify(MESSAGE, &public_key))
    });
}

criterion_group!(benches, bench_sign, bench_aggregate_and_verify);
criterion_main!(benches);
