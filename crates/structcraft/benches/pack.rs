use criterion::{Criterion, criterion_group, criterion_main};
use structcraft::{ByteOrder, FieldDescriptor, Instance, StructType, Value};

fn gen_type(field_count: usize) -> StructType {
    let names: Vec<String> = (0..field_count).map(|i| format!("f{}", i)).collect();
    let mut builder = StructType::builder("Record")
        .field_order(names.clone())
        .byte_order(ByteOrder::BigEndian);

    for name in names {
        builder = builder.field(name, FieldDescriptor::u16());
    }

    builder.build().unwrap()
}

fn gen_instance(struct_type: &StructType) -> Instance {
    // Deterministic but non-trivial pattern
    let values: Vec<Value> = (0..struct_type.len())
        .map(|i| Value::UInt((i * 31 % 65536) as u64))
        .collect();

    struct_type.new_instance(values, Vec::new()).unwrap()
}

fn bench_pack(c: &mut Criterion) {
    for &field_count in &[1usize, 10, 50, 100] {
        let struct_type = gen_type(field_count);
        let instance = gen_instance(&struct_type);

        c.bench_function(&format!("pack_{}_fields", field_count), |b| {
            b.iter(|| {
                let _ = instance.pack().unwrap();
            })
        });
    }
}

fn bench_nested_pack(c: &mut Criterion) {
    let point = StructType::builder("Point")
        .field_order(["x", "y"])
        .field("x", FieldDescriptor::f64())
        .field("y", FieldDescriptor::f64())
        .build()
        .unwrap();
    let bbox = StructType::builder("BoundingBox")
        .field_order(["northwest", "southeast"])
        .nested("northwest", &point)
        .nested("southeast", &point)
        .build()
        .unwrap();
    let instance = bbox
        .from_value(Value::list([[0.0, 10.0], [15.0, 0.0]]))
        .unwrap();

    c.bench_function("pack_bounding_box", |b| {
        b.iter(|| {
            let _ = instance.pack().unwrap();
        })
    });
}

criterion_group!(benches, bench_pack, bench_nested_pack);
criterion_main!(benches);
