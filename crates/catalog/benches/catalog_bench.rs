use catalog::{AudiobookInput, BookInput, Catalog};
use common::DocumentId;
use criterion::{BenchmarkId, Criterion, criterion_group, criterion_main};
use document_store::InMemoryDocumentStore;
use serde_json::json;

fn book() -> BookInput {
    BookInput {
        title: Some("The Name of the Wind".into()),
        author: Some("Patrick Rothfuss".into()),
        pages: Some(json!(662)),
        genre: Some("Fantasy".into()),
        print_type: Some("Paper".into()),
        publisher: Some("DAW Books".into()),
    }
}

fn audiobook(book_id: Option<DocumentId>) -> AudiobookInput {
    AudiobookInput {
        title: Some("The Name of the Wind Unabridged".into()),
        author: Some("Patrick Rothfuss".into()),
        voice_actor: Some("Nick Podehl Reads".into()),
        recording_studio: Some("Brilliance Audio".into()),
        genre: Some("Fantasy".into()),
        audio_format: Some("mp3".into()),
        time: Some("23:45".into()),
        kind: Some("standard".into()),
        book_id: book_id.map(|id| id.to_string()),
    }
}

async fn seeded(books: usize) -> Catalog<InMemoryDocumentStore> {
    let catalog = Catalog::new(InMemoryDocumentStore::new());
    for i in 0..books {
        let id = catalog.books.create(book()).await.unwrap();
        if i % 2 == 0 {
            catalog
                .audiobooks
                .create(audiobook(Some(id)))
                .await
                .unwrap();
        }
    }
    catalog
}

fn bench_list_with_audiobooks(c: &mut Criterion) {
    let rt = tokio::runtime::Runtime::new().unwrap();
    let mut group = c.benchmark_group("catalog/list_with_audiobooks");

    for books in [10, 100, 500] {
        let catalog = rt.block_on(seeded(books));
        group.bench_with_input(BenchmarkId::from_parameter(books), &books, |b, _| {
            b.iter(|| {
                rt.block_on(async {
                    catalog.books.list_with_audiobooks().await.unwrap();
                });
            });
        });
    }

    group.finish();
}

fn bench_link_cycle(c: &mut Criterion) {
    let rt = tokio::runtime::Runtime::new().unwrap();
    let catalog = rt.block_on(seeded(1));
    let book_id = rt.block_on(catalog.books.create(book())).unwrap();

    c.bench_function("catalog/create_delete_linked_audiobook", |b| {
        b.iter(|| {
            rt.block_on(async {
                let id = catalog
                    .audiobooks
                    .create(audiobook(Some(book_id)))
                    .await
                    .unwrap();
                catalog.audiobooks.delete(&id.to_string()).await.unwrap();
            });
        });
    });
}

criterion_group!(benches, bench_list_with_audiobooks, bench_link_cycle);
criterion_main!(benches);
