//! xxHash64 content hashing.
//!
//! Implements standard xxHash64 (matching the published test vectors) as a
//! one-shot function over byte slices plus a streaming state for files that
//! cannot be memory-mapped, and an n-way parallel hasher for file lists.

use log::warn;
use memmap2::Mmap;
use std::fs::File;
use std::io::{ErrorKind, Read};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};

const PRIME64_1: u64 = 0x9E37_79B1_85EB_CA87;
const PRIME64_2: u64 = 0xC2B2_AE3D_27D4_EB4F;
const PRIME64_3: u64 = 0x1656_67B1_9E37_79F9;
const PRIME64_4: u64 = 0x85EB_CA77_C2B2_AE63;
const PRIME64_5: u64 = 0x27D4_EB2F_1656_67C5;

/// Read buffer for the streaming fallback path.
const STREAM_BUFFER_SIZE: usize = 64 * 1024;

#[inline]
fn read_u64(bytes: &[u8], at: usize) -> u64 {
    let mut buf = [0u8; 8];
    buf.copy_from_slice(&bytes[at..at + 8]);
    u64::from_le_bytes(buf)
}

#[inline]
fn read_u32(bytes: &[u8], at: usize) -> u32 {
    let mut buf = [0u8; 4];
    buf.copy_from_slice(&bytes[at..at + 4]);
    u32::from_le_bytes(buf)
}

#[inline]
fn round(acc: u64, input: u64) -> u64 {
    acc.wrapping_add(input.wrapping_mul(PRIME64_2))
        .rotate_left(31)
        .wrapping_mul(PRIME64_1)
}

#[inline]
fn merge_round(acc: u64, val: u64) -> u64 {
    (acc ^ round(0, val))
        .wrapping_mul(PRIME64_1)
        .wrapping_add(PRIME64_4)
}

#[inline]
fn avalanche(mut h64: u64) -> u64 {
    h64 ^= h64 >> 33;
    h64 = h64.wrapping_mul(PRIME64_2);
    h64 ^= h64 >> 29;
    h64 = h64.wrapping_mul(PRIME64_3);
    h64 ^= h64 >> 32;
    h64
}

fn finish_tail(mut h64: u64, tail: &[u8]) -> u64 {
    let mut at = 0;
    while at + 8 <= tail.len() {
        h64 ^= round(0, read_u64(tail, at));
        h64 = h64
            .rotate_left(27)
            .wrapping_mul(PRIME64_1)
            .wrapping_add(PRIME64_4);
        at += 8;
    }
    while at + 4 <= tail.len() {
        h64 ^= u64::from(read_u32(tail, at)).wrapping_mul(PRIME64_1);
        h64 = h64
            .rotate_left(23)
            .wrapping_mul(PRIME64_2)
            .wrapping_add(PRIME64_3);
        at += 4;
    }
    while at < tail.len() {
        h64 ^= u64::from(tail[at]).wrapping_mul(PRIME64_5);
        h64 = h64.rotate_left(11).wrapping_mul(PRIME64_1);
        at += 1;
    }
    avalanche(h64)
}

/// One-shot xxHash64 with seed 0.
pub fn hash_bytes(data: &[u8]) -> u64 {
    xxh64(data, 0)
}

/// One-shot xxHash64.
pub fn xxh64(data: &[u8], seed: u64) -> u64 {
    let mut h64;
    let mut at = 0;

    if data.len() >= 32 {
        let mut v1 = seed.wrapping_add(PRIME64_1).wrapping_add(PRIME64_2);
        let mut v2 = seed.wrapping_add(PRIME64_2);
        let mut v3 = seed;
        let mut v4 = seed.wrapping_sub(PRIME64_1);

        while at + 32 <= data.len() {
            v1 = round(v1, read_u64(data, at));
            v2 = round(v2, read_u64(data, at + 8));
            v3 = round(v3, read_u64(data, at + 16));
            v4 = round(v4, read_u64(data, at + 24));
            at += 32;
        }

        h64 = v1
            .rotate_left(1)
            .wrapping_add(v2.rotate_left(7))
            .wrapping_add(v3.rotate_left(12))
            .wrapping_add(v4.rotate_left(18));
        h64 = merge_round(h64, v1);
        h64 = merge_round(h64, v2);
        h64 = merge_round(h64, v3);
        h64 = merge_round(h64, v4);
    } else {
        h64 = seed.wrapping_add(PRIME64_5);
    }

    h64 = h64.wrapping_add(data.len() as u64);
    finish_tail(h64, &data[at..])
}

/// Streaming xxHash64 state with a 32-byte lane buffer.
#[derive(Debug, Clone)]
pub struct StreamingHasher {
    seed: u64,
    total_len: u64,
    lanes: [u64; 4],
    buffer: [u8; 32],
    buffered: usize,
}

impl StreamingHasher {
    pub fn new(seed: u64) -> Self {
        Self {
            seed,
            total_len: 0,
            lanes: [
                seed.wrapping_add(PRIME64_1).wrapping_add(PRIME64_2),
                seed.wrapping_add(PRIME64_2),
                seed,
                seed.wrapping_sub(PRIME64_1),
            ],
            buffer: [0; 32],
            buffered: 0,
        }
    }

    pub fn reset(&mut self) {
        *self = Self::new(self.seed);
    }

    fn consume_block(&mut self, block: &[u8]) {
        self.lanes[0] = round(self.lanes[0], read_u64(block, 0));
        self.lanes[1] = round(self.lanes[1], read_u64(block, 8));
        self.lanes[2] = round(self.lanes[2], read_u64(block, 16));
        self.lanes[3] = round(self.lanes[3], read_u64(block, 24));
    }

    pub fn update(&mut self, mut data: &[u8]) {
        self.total_len += data.len() as u64;

        if self.buffered > 0 {
            let want = 32 - self.buffered;
            if data.len() < want {
                self.buffer[self.buffered..self.buffered + data.len()].copy_from_slice(data);
                self.buffered += data.len();
                return;
            }
            self.buffer[self.buffered..].copy_from_slice(&data[..want]);
            data = &data[want..];
            let block = self.buffer;
            self.consume_block(&block);
            self.buffered = 0;
        }

        while data.len() >= 32 {
            self.consume_block(&data[..32]);
            data = &data[32..];
        }

        if !data.is_empty() {
            self.buffer[..data.len()].copy_from_slice(data);
            self.buffered = data.len();
        }
    }

    pub fn finalize(&self) -> u64 {
        let mut h64 = if self.total_len >= 32 {
            let [v1, v2, v3, v4] = self.lanes;
            let mut acc = v1
                .rotate_left(1)
                .wrapping_add(v2.rotate_left(7))
                .wrapping_add(v3.rotate_left(12))
                .wrapping_add(v4.rotate_left(18));
            acc = merge_round(acc, v1);
            acc = merge_round(acc, v2);
            acc = merge_round(acc, v3);
            merge_round(acc, v4)
        } else {
            self.seed.wrapping_add(PRIME64_5)
        };

        h64 = h64.wrapping_add(self.total_len);
        finish_tail(h64, &self.buffer[..self.buffered])
    }
}

/// Hash the content of a single file.
///
/// Memory-maps the file when possible and falls back to streaming reads
/// otherwise. Returns 0 for empty files and on any error; the host treats 0
/// as "no hash".
pub fn hash_file(path: &Path) -> u64 {
    let file = match File::open(path) {
        Ok(file) => file,
        Err(_) => return 0,
    };

    let len = match file.metadata() {
        Ok(metadata) => metadata.len(),
        Err(_) => return 0,
    };
    if len == 0 {
        return 0;
    }

    match unsafe { Mmap::map(&file) } {
        Ok(mapped) => hash_bytes(&mapped),
        Err(_) => hash_reader(file),
    }
}

fn hash_reader(mut file: File) -> u64 {
    let mut hasher = StreamingHasher::new(0);
    let mut buffer = vec![0u8; STREAM_BUFFER_SIZE];

    loop {
        match file.read(&mut buffer) {
            Ok(0) => break,
            Ok(n) => hasher.update(&buffer[..n]),
            Err(e) if e.kind() == ErrorKind::Interrupted => continue,
            Err(e) => {
                warn!("read failed while hashing: {e}");
                return 0;
            }
        }
    }

    hasher.finalize()
}

/// Hash a list of files with up to `workers` threads.
///
/// The worker count is clamped to `[1, cpu_count]`. Result order matches the
/// input order; a file that fails to hash stores 0 in its slot without
/// aborting the batch. Workers share an atomic cursor and each result slot is
/// written by exactly one worker.
pub fn hash_files(paths: &[PathBuf], workers: u32) -> Vec<u64> {
    if paths.is_empty() {
        return Vec::new();
    }

    let workers = workers.clamp(1, num_cpus::get() as u32) as usize;

    if paths.len() <= workers {
        return paths.iter().map(|p| hash_file(p)).collect();
    }

    let results: Vec<AtomicU64> = (0..paths.len()).map(|_| AtomicU64::new(0)).collect();
    let cursor = AtomicUsize::new(0);

    std::thread::scope(|scope| {
        for _ in 0..workers {
            scope.spawn(|| loop {
                let idx = cursor.fetch_add(1, Ordering::Relaxed);
                if idx >= paths.len() {
                    break;
                }
                results[idx].store(hash_file(&paths[idx]), Ordering::Relaxed);
            });
        }
    });

    results.into_iter().map(AtomicU64::into_inner).collect()
}
