//! ObjectId generator (spec.md §4.5).
//!
//! Layout: 4-byte seconds-since-epoch (big-endian), 3 bytes of the MD5
//! digest of the host's identity, 2-byte process id (big-endian), 3-byte
//! big-endian counter that increments monotonically per process.
//!
//! The host digest, process id, clock, and counter are each modeled as an
//! injected collaborator trait (spec §9's "counter as capability" note,
//! generalized to the other three sources) so the generator itself stays a
//! pure function of its inputs and is deterministic under test doubles.

use std::sync::atomic::{AtomicU32, Ordering};
use std::time::{SystemTime, UNIX_EPOCH};

use md5::{Digest, Md5};

use crate::value::ObjectId;

/// Supplies the current time, as seconds since the Unix epoch.
pub trait Clock {
    fn unix_seconds(&self) -> u32;
}

/// Supplies the 3 bytes identifying this host (spec §4.5: "a hash of the
/// machine identifier").
pub trait HostIdentity {
    fn host_digest(&self) -> [u8; 3];
}

/// Supplies the 2-byte process identifier.
pub trait ProcessIdentity {
    fn process_id(&self) -> u16;
}

/// Supplies the next value of the monotonic per-process counter.
pub trait CounterSource {
    fn next(&self) -> u32;
}

/// Reads the wall clock via [`SystemTime::now`].
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn unix_seconds(&self) -> u32 {
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_secs() as u32)
            .unwrap_or(0)
    }
}

/// Hashes the local hostname (via the `hostname` crate) with MD5 and keeps
/// its first 3 bytes, matching the classic driver behavior spec §4.5
/// describes.
#[derive(Debug, Default, Clone, Copy)]
pub struct DefaultHostIdentity;

impl HostIdentity for DefaultHostIdentity {
    fn host_digest(&self) -> [u8; 3] {
        let name = hostname::get()
            .ok()
            .and_then(|h| h.into_string().ok())
            .unwrap_or_default();
        let digest = Md5::digest(name.as_bytes());
        [digest[0], digest[1], digest[2]]
    }
}

/// Reads the OS process id and truncates it to 16 bits.
#[derive(Debug, Default, Clone, Copy)]
pub struct DefaultProcessIdentity;

impl ProcessIdentity for DefaultProcessIdentity {
    fn process_id(&self) -> u16 {
        std::process::id() as u16
    }
}

/// A process-wide monotonic counter, seeded randomly so two processes
/// restarting at the same second don't collide on counter value alone.
#[derive(Debug)]
pub struct AtomicCounter(AtomicU32);

impl AtomicCounter {
    pub fn new() -> Self {
        Self(AtomicU32::new(rand::random()))
    }
}

impl Default for AtomicCounter {
    fn default() -> Self {
        Self::new()
    }
}

impl CounterSource for AtomicCounter {
    fn next(&self) -> u32 {
        // Wraps within 24 bits; spec §4.5 only requires the low 24 bits be
        // written, wraparound itself is not an error condition.
        self.0.fetch_add(1, Ordering::Relaxed)
    }
}

/// Builds [`ObjectId`]s from four injected collaborators (spec §9): swap in
/// test doubles to get deterministic ids, or the `Default*`/`System*`/
/// `Atomic*` types above for real generation.
pub struct ObjectIdGenerator<C, H, P, N> {
    clock: C,
    host: H,
    process: P,
    counter: N,
}

impl ObjectIdGenerator<SystemClock, DefaultHostIdentity, DefaultProcessIdentity, AtomicCounter> {
    /// A generator wired to the real clock, host, process, and a fresh
    /// randomly-seeded counter.
    pub fn new() -> Self {
        Self {
            clock: SystemClock,
            host: DefaultHostIdentity,
            process: DefaultProcessIdentity,
            counter: AtomicCounter::new(),
        }
    }
}

impl Default
    for ObjectIdGenerator<SystemClock, DefaultHostIdentity, DefaultProcessIdentity, AtomicCounter>
{
    fn default() -> Self {
        Self::new()
    }
}

impl<C: Clock, H: HostIdentity, P: ProcessIdentity, N: CounterSource> ObjectIdGenerator<C, H, P, N> {
    /// Builds a generator from explicit collaborators, e.g. for
    /// deterministic tests.
    pub fn with_collaborators(clock: C, host: H, process: P, counter: N) -> Self {
        Self {
            clock,
            host,
            process,
            counter,
        }
    }

    /// Generates one ObjectId per spec §4.5's 12-byte layout.
    pub fn generate(&self) -> ObjectId {
        let mut bytes = [0u8; 12];
        bytes[0..4].copy_from_slice(&self.clock.unix_seconds().to_be_bytes());
        bytes[4..7].copy_from_slice(&self.host.host_digest());
        bytes[7..9].copy_from_slice(&self.process.process_id().to_be_bytes());
        let counter = self.counter.next() & 0x00ff_ffff;
        let counter_bytes = counter.to_be_bytes();
        bytes[9..12].copy_from_slice(&counter_bytes[1..4]);
        ObjectId::from_bytes(bytes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;

    struct FixedClock(u32);
    impl Clock for FixedClock {
        fn unix_seconds(&self) -> u32 {
            self.0
        }
    }

    struct FixedHost([u8; 3]);
    impl HostIdentity for FixedHost {
        fn host_digest(&self) -> [u8; 3] {
            self.0
        }
    }

    struct FixedProcess(u16);
    impl ProcessIdentity for FixedProcess {
        fn process_id(&self) -> u16 {
            self.0
        }
    }

    struct SeqCounter(Cell<u32>);
    impl CounterSource for SeqCounter {
        fn next(&self) -> u32 {
            let v = self.0.get();
            self.0.set(v + 1);
            v
        }
    }

    fn gen_with(seconds: u32, host: [u8; 3], pid: u16, start: u32) -> ObjectIdGenerator<FixedClock, FixedHost, FixedProcess, SeqCounter> {
        ObjectIdGenerator::with_collaborators(
            FixedClock(seconds),
            FixedHost(host),
            FixedProcess(pid),
            SeqCounter(Cell::new(start)),
        )
    }

    #[test]
    fn layout_matches_spec_byte_order() {
        let gen = gen_with(0x01020304, [0xaa, 0xbb, 0xcc], 0x0506, 0x0708_09);
        let id = gen.generate();
        let bytes = id.bytes();
        assert_eq!(&bytes[0..4], &[0x01, 0x02, 0x03, 0x04]);
        assert_eq!(&bytes[4..7], &[0xaa, 0xbb, 0xcc]);
        assert_eq!(&bytes[7..9], &[0x05, 0x06]);
        assert_eq!(&bytes[9..12], &[0x07, 0x08, 0x09]);
    }

    #[test]
    fn counter_increments_monotonically() {
        let gen = gen_with(0, [0, 0, 0], 0, 0);
        let a = gen.generate();
        let b = gen.generate();
        let c = gen.generate();
        assert_eq!(a.bytes()[9..12], [0, 0, 0]);
        assert_eq!(b.bytes()[9..12], [0, 0, 1]);
        assert_eq!(c.bytes()[9..12], [0, 0, 2]);
    }

    #[test]
    fn counter_truncates_to_24_bits() {
        let gen = gen_with(0, [0, 0, 0], 0, 0x00ff_ffff);
        let a = gen.generate();
        let b = gen.generate();
        assert_eq!(a.bytes()[9..12], [0xff, 0xff, 0xff]);
        assert_eq!(b.bytes()[9..12], [0, 0, 0]);
    }

    #[test]
    fn default_generator_produces_distinct_ids() {
        let gen = ObjectIdGenerator::new();
        let a = gen.generate();
        let b = gen.generate();
        assert_ne!(a, b);
    }
}
