//! Performance benchmarks for the stamp codec
//!
//! Run with: cargo bench

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use tstamp::config::SessionConfig;
use tstamp::core::{Receiver, Sender};
use tstamp::protocol::{read_preamble, write_preamble, Frame};
use tstamp::report::ArrivalRecord;
use tstamp::timestamp::TimeSpec;

fn bench_encode_stamp(c: &mut Criterion) {
    let mut group = c.benchmark_group("encode_stamp");

    for pad_len in [2u32, 32, 512, 8192].iter() {
        let frame = Frame::Stamp {
            seq: 42,
            sent: TimeSpec::new(1_700_000_000, 123_456_789),
            pad_len: *pad_len,
        };
        group.throughput(Throughput::Bytes(frame.encoded_len() as u64));
        group.bench_with_input(BenchmarkId::from_parameter(pad_len), &frame, |b, frame| {
            let mut buf = Vec::with_capacity(frame.encoded_len());
            b.iter(|| {
                buf.clear();
                black_box(frame.write_to(&mut buf).unwrap());
            });
        });
    }

    group.finish();
}

fn bench_decode_stream(c: &mut Criterion) {
    let mut wire = Vec::new();
    write_preamble(&mut wire).unwrap();
    for seq in 0..1024 {
        Frame::Stamp { seq, sent: TimeSpec::new(1_700_000_000, 0), pad_len: 32 }
            .write_to(&mut wire)
            .unwrap();
    }

    let mut group = c.benchmark_group("decode_stream");
    group.throughput(Throughput::Elements(1024));
    group.bench_function("1024_stamps", |b| {
        b.iter(|| {
            let mut reader = wire.as_slice();
            read_preamble(&mut reader).unwrap();
            while let Some(frame) = Frame::read_from(&mut reader).unwrap() {
                black_box(frame);
            }
        });
    });
    group.finish();
}

fn bench_session(c: &mut Criterion) {
    c.bench_function("session_1024_stamps", |b| {
        b.iter(|| {
            let mut wire = Vec::new();
            Sender::new(SessionConfig { count: Some(1024), ..SessionConfig::sender() })
                .run(&mut wire)
                .unwrap();

            let mut records: Vec<ArrivalRecord> = Vec::with_capacity(1024);
            let summary = Receiver::new(SessionConfig::receiver())
                .run(&mut wire.as_slice(), &mut records)
                .unwrap();
            black_box(summary);
        });
    });
}

criterion_group!(benches, bench_encode_stamp, bench_decode_stream, bench_session);
criterion_main!(benches);
