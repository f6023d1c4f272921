use criterion::{Criterion, criterion_group, criterion_main};
use blockpad_engine::editing::{BlockRef, Cmd, Document, Placement};
use blockpad_syntax::Language;
mod common;

fn bench_command_operations(c: &mut Criterion) {
    let mut group = c.benchmark_group("commands");
    group.sample_size(10);

    let content = common::generate_document(200);
    let doc = Document::from_bytes(content.as_bytes()).unwrap();

    group.bench_function("insert_and_delete_block", |b| {
        let mut d = doc.clone();
        d.set_selection(0..0);
        b.iter(|| {
            d.apply(Cmd::InsertBlock {
                placement: Placement::AfterCurrent,
                language: Some(Language::Json),
                auto_detect: false,
            });
            let patch = d.apply(Cmd::DeleteBlock {
                target: BlockRef::Active,
            });
            std::hint::black_box(patch);
        });
    });

    group.bench_function("retype_block", |b| {
        let mut d = doc.clone();
        let mut toggle = false;
        b.iter(|| {
            toggle = !toggle;
            let language = if toggle { Language::Yaml } else { Language::Json };
            let patch = d.apply(Cmd::RetypeBlock {
                target: BlockRef::Ordinal(std::hint::black_box(100)),
                language,
                auto_detect: false,
            });
            std::hint::black_box(patch);
        });
    });

    group.bench_function("move_block_down_and_up", |b| {
        let mut d = doc.clone();
        let mid = d.index().blocks()[100].content_range.start;
        d.set_selection(mid..mid);
        b.iter(|| {
            d.apply(Cmd::MoveBlockDown {
                target: BlockRef::Active,
            });
            let patch = d.apply(Cmd::MoveBlockUp {
                target: BlockRef::Active,
            });
            std::hint::black_box(patch);
        });
    });

    group.finish();
}

criterion_group!(benches, bench_command_operations);
criterion_main!(benches);
