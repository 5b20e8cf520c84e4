#![feature(test)]
extern crate plateblob;
extern crate test;
#[macro_use]
extern crate trackable;

use plateblob::blob::{BlobManager, BlobManagerBuilder};
use test::Bencher;

#[bench]
fn lock_and_release_single_blob(b: &mut Bencher) {
    let manager = track_try_unwrap!(BlobManager::new(1024, 1, 1));
    b.iter(|| {
        let id = track_try_unwrap!(manager.request_lock(1));
        track_try_unwrap!(manager.release_lock(id, 1));
    });
}

#[bench]
fn lock_and_release_many_blobs(b: &mut Bencher) {
    let manager = track_try_unwrap!(BlobManager::new(1024, 1024, 1024));
    b.iter(|| {
        let id = track_try_unwrap!(manager.request_lock(1));
        track_try_unwrap!(manager.release_lock(id, 1));
    });
}

#[bench]
fn lock_with_mostly_full_blobs(b: &mut Bencher) {
    // 末尾の一つを除き、全てのblobが満杯
    let offsets = (0..1023).map(|_| 1024 * 1024).collect::<Vec<_>>();
    let manager = track_try_unwrap!(BlobManagerBuilder::new()
        .max_blob_size_mb(1)
        .initial_blobs(1024)
        .max_blobs(1024)
        .blob_offsets(offsets)
        .finish());
    b.iter(|| {
        let id = track_try_unwrap!(manager.request_lock(1));
        track_try_unwrap!(manager.release_lock(id, 1));
    });
}
