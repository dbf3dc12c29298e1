//! Benchmarks for call-site classification and instrumentation.
//!
//! - Single-callee classification for each interesting shape
//! - Full pass over a module with many callers and a mix of routines

extern crate cmplog_routines;

use cmplog_routines::{
    cmplog::{classify, CmpLogRoutinesPass, MarkerTable},
    compiler::EventLog,
    ir::{FunctionType, IrBuilder, IrType, Module},
};
use criterion::{criterion_group, criterion_main, BatchSize, Criterion};
use std::hint::black_box;

const LLVM_STRING_EQ: &str =
    "_ZNSt3__1eqIcNS_11char_traitsIcEENS_9allocatorIcEEEEbRKNS_12basic_stringIT_T0_T1_EEPKS6_";

fn strcmp_ty() -> FunctionType {
    FunctionType::new(vec![IrType::i8_ptr(), IrType::i8_ptr()], IrType::i32())
}

/// Benchmark an exact-name hit. Signature: i32 strcmp(i8*, i8*)
fn bench_classify_exact_name(c: &mut Criterion) {
    let markers = MarkerTable::builtin();
    let ty = strcmp_ty();

    c.bench_function("classify_exact_name", |b| {
        b.iter(|| black_box(classify(black_box("strcmp"), &ty, &markers)));
    });
}

/// Benchmark a managed-string hit, which falls through every exact-name set first.
fn bench_classify_managed_string(c: &mut Criterion) {
    let markers = MarkerTable::builtin();
    let string = IrType::named("class.std::__1::basic_string").pointer_to();
    let ty = FunctionType::new(vec![string, IrType::i8_ptr()], IrType::i1());

    c.bench_function("classify_managed_string", |b| {
        b.iter(|| black_box(classify(black_box(LLVM_STRING_EQ), &ty, &markers)));
    });
}

/// Benchmark a miss. Signature: i32 puts(i8*)
fn bench_classify_miss(c: &mut Criterion) {
    let markers = MarkerTable::builtin();
    let ty = FunctionType::new(vec![IrType::i8_ptr()], IrType::i32());

    c.bench_function("classify_miss", |b| {
        b.iter(|| black_box(classify(black_box("puts"), &ty, &markers)));
    });
}

/// Builds a module with `callers` functions, each calling memcmp, strcmp and puts.
fn build_module(callers: usize) -> Module {
    let mut module = Module::new("bench");
    let ptr = IrType::i8_ptr();
    let memcmp = module
        .add_function(
            "memcmp",
            FunctionType::new(vec![ptr.clone(), ptr.clone(), IrType::i32()], IrType::i32()),
        )
        .unwrap();
    let strcmp = module.add_function("strcmp", strcmp_ty()).unwrap();
    let puts = module
        .add_function("puts", FunctionType::new(vec![ptr.clone()], IrType::i32()))
        .unwrap();

    for index in 0..callers {
        let func = module
            .add_function(
                format!("caller_{index}"),
                FunctionType::new(vec![ptr.clone(), ptr.clone()], IrType::Void),
            )
            .unwrap();
        let entry = module.function_mut(func).unwrap().append_block();
        let mut builder = IrBuilder::at_end(&mut module, func, entry);
        let (a, b) = (builder.arg(0).unwrap(), builder.arg(1).unwrap());
        let len = builder.const_int(IrType::i32(), 16).unwrap();
        builder.create_call(memcmp, &[a, b, len]).unwrap();
        builder.create_call(strcmp, &[a, b]).unwrap();
        builder.create_call(puts, &[a]).unwrap();
        builder.create_ret(None).unwrap();
    }
    module
}

/// Benchmark the whole pass, including verification, on 1000 callers.
fn bench_instrument_module(c: &mut Criterion) {
    let module = build_module(1000);
    let pass = CmpLogRoutinesPass::default();

    c.bench_function("instrument_1000_callers", |b| {
        b.iter_batched(
            || module.clone(),
            |mut module| {
                let report = pass.instrument(&mut module, &EventLog::new()).unwrap();
                black_box(report)
            },
            BatchSize::LargeInput,
        );
    });
}

criterion_group!(
    benches,
    bench_classify_exact_name,
    bench_classify_managed_string,
    bench_classify_miss,
    bench_instrument_module,
);
criterion_main!(benches);
