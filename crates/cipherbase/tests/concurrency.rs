//! Concurrent callers against one vault.

use std::sync::Arc;

use cipherbase::{DatabaseId, VaultEvent};
use cipherbase_testkit::{identity, multi_party_identities, TestFixture};

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_creates_get_distinct_sequential_ids() {
    let fixture = Arc::new(TestFixture::new());
    let parties = multi_party_identities(8);

    let mut tasks = Vec::new();
    for (i, party) in parties.iter().copied().enumerate() {
        let fixture = fixture.clone();
        tasks.push(tokio::spawn(async move {
            fixture
                .create_database(&party, &format!("db-{i}"))
                .await
                .unwrap()
        }));
    }

    let mut ids = Vec::new();
    for task in tasks {
        ids.push(task.await.unwrap());
    }
    ids.sort();

    let expected: Vec<_> = (1..=8).map(DatabaseId::new).collect();
    assert_eq!(ids, expected);
    assert_eq!(fixture.vault.total_databases().await.unwrap(), 8);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_writers_fill_every_index_once() {
    let fixture = Arc::new(TestFixture::new());
    let owner = identity(1);
    let writers = multi_party_identities(6);
    let id = fixture.create_database(&owner, "shared").await.unwrap();
    for writer in &writers {
        fixture.vault.grant_access(&owner, id, writer).await.unwrap();
    }

    let per_writer = 10u64;
    let mut tasks = Vec::new();
    for (w, writer) in writers.iter().copied().enumerate() {
        let fixture = fixture.clone();
        tasks.push(tokio::spawn(async move {
            let mut indices = Vec::new();
            for n in 0..per_writer {
                let value = w as u64 * 1_000 + n;
                indices.push(fixture.store(&writer, id, value).await.unwrap());
            }
            indices
        }));
    }

    let mut indices = Vec::new();
    for task in tasks {
        indices.extend(task.await.unwrap());
    }
    indices.sort_unstable();

    let total = writers.len() as u64 * per_writer;
    assert_eq!(indices, (0..total).collect::<Vec<_>>());
    assert_eq!(fixture.vault.record_count(id).await.unwrap(), total);

    // Every record is visible to every member regardless of who wrote it.
    for handle in fixture.vault.record_handles(id).await.unwrap() {
        assert!(fixture.coprocessor.can_decrypt(&handle, &owner));
        for writer in &writers {
            assert!(fixture.coprocessor.can_decrypt(&handle, writer));
        }
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_readers_never_see_ungranted_records() {
    let fixture = Arc::new(TestFixture::new());
    let owner = identity(1);
    let bob = identity(2);
    let id = fixture.create_database(&owner, "watched").await.unwrap();
    fixture.vault.grant_access(&owner, id, &bob).await.unwrap();

    let writer = {
        let fixture = fixture.clone();
        tokio::spawn(async move {
            for value in 0..50 {
                fixture.store(&owner, id, value).await.unwrap();
            }
        })
    };

    let reader = {
        let fixture = fixture.clone();
        tokio::spawn(async move {
            let mut last = 0;
            while last < 50 {
                let handles = fixture.vault.record_handles(id).await.unwrap();
                assert!(handles.len() as u64 >= last);
                for handle in &handles {
                    assert!(fixture.coprocessor.can_decrypt(handle, &bob));
                }
                last = handles.len() as u64;
                tokio::task::yield_now().await;
            }
        })
    };

    writer.await.unwrap();
    reader.await.unwrap();
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_journal_order_matches_commit_order() {
    let fixture = Arc::new(TestFixture::new());
    let owner = identity(1);
    let id = fixture.create_database(&owner, "ordered").await.unwrap();

    let mut tasks = Vec::new();
    for _ in 0..4 {
        let fixture = fixture.clone();
        tasks.push(tokio::spawn(async move {
            for value in 0..10 {
                fixture.store(&owner, id, value).await.unwrap();
            }
        }));
    }
    for task in tasks {
        task.await.unwrap();
    }

    let journal = fixture.vault.events_since(0, 1_000).await.unwrap();
    assert_eq!(journal.len(), 41);

    let mut expected_index = 0;
    for (i, entry) in journal.iter().enumerate() {
        assert_eq!(entry.seq, i as u64 + 1);
        if let VaultEvent::RecordStored { index, .. } = entry.event {
            assert_eq!(index, expected_index);
            expected_index += 1;
        }
    }
    assert_eq!(expected_index, 40);
}
