#![no_main]

use cmplog_routines::{
    cmplog::{classify, Category, MarkerTable, SignatureFlags},
    ir::{FunctionType, IrType},
};
use libfuzzer_sys::fuzz_target;

fn decode_type(byte: u8) -> IrType {
    match byte % 10 {
        0 => IrType::Void,
        1 => IrType::i1(),
        2 => IrType::i16(),
        3 => IrType::i32(),
        4 => IrType::i64(),
        5 => IrType::Float,
        6 => IrType::i8_ptr(),
        7 => IrType::i8().pointer_in(u32::from(byte >> 7)),
        8 => IrType::named("class.std::__1::basic_string").pointer_to(),
        _ => IrType::i32().pointer_to(),
    }
}

fuzz_target!(|data: &[u8]| {
    let Some((&header, rest)) = data.split_first() else {
        return;
    };
    let param_count = usize::from(header % 5).min(rest.len());
    let (types, name) = rest.split_at(param_count);
    let Ok(name) = std::str::from_utf8(name) else {
        return;
    };

    let params = types.iter().copied().map(decode_type).collect();
    let ty = FunctionType::new(params, decode_type(header >> 3));
    let category = classify(name, &ty, &MarkerTable::builtin());

    let flags = SignatureFlags::compute(name, &ty);
    if flags.generic_ternary {
        assert!(flags.generic_binary);
    }
    if category == Some(Category::GenericPointerBinary) {
        assert!(!flags.generic_ternary);
    }
    if category.is_none() {
        assert!(!flags.generic_binary);
    }
});
