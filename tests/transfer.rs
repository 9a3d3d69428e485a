//! End-to-end transfers between two connections joined by an in-memory byte
//! pipe, with configurable loss and corruption on each direction.

use arqlink::{Channel, Connection, LinkError, RetryConfig};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::collections::VecDeque;
use std::io;
use std::sync::mpsc::{self, Receiver, RecvTimeoutError, Sender};
use std::thread;
use std::time::Duration;

/// What the wire does to one outbound frame.
enum Fate {
    Deliver,
    Drop,
    CorruptBit(usize),
}

type Mangler = Box<dyn FnMut(&[u8]) -> Fate + Send>;

/// One end of a full-duplex byte pipe. Writes are framed messages pushed to
/// the peer; reads drain a local byte queue so frame boundaries disappear,
/// just like a serial line.
struct Wire {
    tx: Sender<Vec<u8>>,
    rx: Receiver<Vec<u8>>,
    pending: VecDeque<u8>,
    mangle: Mangler,
}

impl Channel for Wire {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        if self.pending.is_empty() {
            match self.rx.recv_timeout(Duration::from_millis(1)) {
                Ok(bytes) => self.pending.extend(bytes),
                // Timeout tick; a hung-up peer looks like permanent silence.
                Err(RecvTimeoutError::Timeout) | Err(RecvTimeoutError::Disconnected) => {
                    return Ok(0)
                }
            }
        }
        let n = buf.len().min(self.pending.len());
        for (dst, byte) in buf.iter_mut().zip(self.pending.drain(..n)) {
            *dst = byte;
        }
        Ok(n)
    }

    fn write(&mut self, buf: &[u8]) -> io::Result<()> {
        let mut bytes = buf.to_vec();
        match (self.mangle)(buf) {
            Fate::Drop => return Ok(()),
            Fate::CorruptBit(bit) => {
                let i = (bit / 8) % bytes.len();
                bytes[i] ^= 1 << (bit % 8);
            }
            Fate::Deliver => {}
        }
        // A peer that already hung up just swallows the bytes.
        self.tx.send(bytes).ok();
        Ok(())
    }
}

fn wire_pair(a_mangle: Mangler, b_mangle: Mangler) -> (Wire, Wire) {
    let (atx, brx) = mpsc::channel();
    let (btx, arx) = mpsc::channel();
    (
        Wire { tx: atx, rx: arx, pending: VecDeque::new(), mangle: a_mangle },
        Wire { tx: btx, rx: brx, pending: VecDeque::new(), mangle: b_mangle },
    )
}

fn clean() -> Mangler {
    Box::new(|_| Fate::Deliver)
}

fn is_data_frame(frame: &[u8]) -> bool {
    // Tag with neither FIN nor ACK set, carrying a payload.
    frame[0] == 0b1100_1100 && frame[5..7] != [0, 0]
}

fn test_bytes(len: usize, seed: u64) -> Vec<u8> {
    let mut rng = StdRng::seed_from_u64(seed);
    let mut data = vec![0u8; len];
    rng.fill(data.as_mut_slice());
    data
}

/// Patient limits: the 1ms read tick makes each wait window ~60ms.
fn cfg() -> RetryConfig {
    RetryConfig { max_bursts: 30, max_idle_reads: 60 }
}

/// Run a full transfer: one thread sends and closes, the other receives
/// until `len` bytes arrived and then passively drains. Returns the bytes
/// the receiver produced.
fn run_transfer(data: Vec<u8>, sender_wire: Wire, receiver_wire: Wire) -> Vec<u8> {
    let len = data.len();

    let tx = thread::spawn(move || {
        let mut conn = Connection::new(sender_wire, cfg());
        let sent = conn.send(&data).expect("send failed");
        assert_eq!(sent, len, "sender gave up before finishing");
        assert!(conn.close(8).expect("close failed"), "close not confirmed");
    });

    let rx = thread::spawn(move || {
        let mut conn = Connection::new(receiver_wire, cfg());
        let mut collected = Vec::with_capacity(len);
        let mut chunk = [0u8; 700];
        for _ in 0..10_000 {
            if collected.len() == len {
                break;
            }
            match conn.recv(&mut chunk) {
                Ok(n) => collected.extend_from_slice(&chunk[..n]),
                Err(LinkError::Finalized) => break,
                Err(e) => panic!("recv failed: {e}"),
            }
        }
        conn.wait(500).expect("wait failed");
        collected
    });

    tx.join().expect("sender thread panicked");
    rx.join().expect("receiver thread panicked")
}

#[test]
fn transfer_over_reliable_pipe() {
    let data = test_bytes(5000, 1);
    let (a, b) = wire_pair(clean(), clean());
    assert_eq!(run_transfer(data.clone(), a, b), data);
}

#[test]
fn transfer_with_every_third_data_frame_dropped() {
    let mut count = 0u32;
    let dropper: Mangler = Box::new(move |frame| {
        if is_data_frame(frame) {
            count += 1;
            if count % 3 == 0 {
                return Fate::Drop;
            }
        }
        Fate::Deliver
    });

    let data = test_bytes(4000, 2);
    let (a, b) = wire_pair(dropper, clean());
    assert_eq!(run_transfer(data.clone(), a, b), data);
}

#[test]
fn transfer_with_random_loss_in_both_directions() {
    fn lossy(seed: u64) -> Mangler {
        let mut rng = StdRng::seed_from_u64(seed);
        Box::new(move |_| if rng.gen_bool(0.2) { Fate::Drop } else { Fate::Deliver })
    }

    let data = test_bytes(3000, 3);
    let (a, b) = wire_pair(lossy(10), lossy(11));
    assert_eq!(run_transfer(data.clone(), a, b), data);
}

#[test]
fn transfer_with_bit_corruption() {
    let mut rng = StdRng::seed_from_u64(4);
    let mut count = 0u32;
    let corruptor: Mangler = Box::new(move |frame| {
        count += 1;
        if count % 5 == 0 {
            // Any bit of the frame: header, payload, or checksum.
            Fate::CorruptBit(rng.gen_range(0..frame.len() * 8))
        } else {
            Fate::Deliver
        }
    });

    let data = test_bytes(3000, 5);
    let (a, b) = wire_pair(corruptor, clean());
    assert_eq!(run_transfer(data.clone(), a, b), data);
}

#[test]
fn transfer_at_exact_window_boundaries() {
    use arqlink::frame::{MAX_PAYLOAD, WINDOW_SIZE};

    // Sizes right at the frame and window edges: one full frame, one byte
    // over, a burst that fills the whole window, and one byte into the next.
    let full_window = WINDOW_SIZE * MAX_PAYLOAD;
    for len in [MAX_PAYLOAD, MAX_PAYLOAD + 1, full_window, full_window + 1] {
        let data = test_bytes(len, len as u64);
        let (a, b) = wire_pair(clean(), clean());
        assert_eq!(run_transfer(data.clone(), a, b), data, "length {len}");
    }
}

#[test]
fn transfer_with_duplicated_frames() {
    let duplicator: Mangler = Box::new(|_| Fate::Deliver);
    let data = test_bytes(2000, 6);

    // Duplicate at the channel level instead: wrap the sender wire's tx by
    // sending everything twice.
    let (mut a, b) = wire_pair(duplicator, clean());
    let tx2 = a.tx.clone();
    a.mangle = Box::new(move |frame| {
        tx2.send(frame.to_vec()).ok();
        Fate::Deliver
    });

    assert_eq!(run_transfer(data.clone(), a, b), data);
}

#[test]
fn close_succeeds_when_first_fin_is_dropped() {
    let mut first = true;
    let fin_dropper: Mangler = Box::new(move |frame| {
        let is_fin = frame[0] & 0b10 != 0;
        if is_fin && first {
            first = false;
            return Fate::Drop;
        }
        Fate::Deliver
    });

    let (a, b) = wire_pair(fin_dropper, clean());

    let closer = thread::spawn(move || {
        let mut conn = Connection::new(a, cfg());
        assert!(conn.close(8).expect("close failed"), "close not confirmed");
        assert!(conn.is_closed());
    });

    let responder = thread::spawn(move || {
        let mut conn = Connection::new(b, cfg());
        conn.wait(1500).expect("wait failed");
    });

    closer.join().unwrap();
    responder.join().unwrap();
}

#[test]
fn reset_allows_back_to_back_transfers() {
    let first = test_bytes(1500, 7);
    let second = test_bytes(900, 8);

    let (a, b) = wire_pair(clean(), clean());
    // The receiver signals when its FIN-answering drain is over, so the
    // second stream does not run into stray FIN replies.
    let (ready_tx, ready_rx) = mpsc::channel::<()>();

    let f1 = first.clone();
    let f2 = second.clone();
    let tx = thread::spawn(move || {
        let mut conn = Connection::new(a, cfg());
        assert_eq!(conn.send(&f1).expect("send failed"), f1.len());
        assert!(conn.close(8).expect("close failed"));
        conn.reset();
        ready_rx.recv().expect("receiver hung up");
        // Flush any late FIN replies left over from the first teardown.
        let mut junk = [0u8; 256];
        while conn.channel_mut().read(&mut junk).expect("flush failed") > 0 {}
        assert_eq!(conn.send(&f2).expect("send failed"), f2.len());
        assert!(conn.close(8).expect("close failed"));
    });

    let l1 = first.len();
    let l2 = second.len();
    let rx = thread::spawn(move || {
        let mut conn = Connection::new(b, cfg());
        let mut out = Vec::new();
        let mut chunk = [0u8; 700];
        for _ in 0..10_000 {
            if out.len() == l1 {
                break;
            }
            match conn.recv(&mut chunk) {
                Ok(n) => out.extend_from_slice(&chunk[..n]),
                Err(e) => panic!("recv failed: {e}"),
            }
        }
        // Answer the sender's FIN, then start over for the second stream.
        conn.wait(200).expect("wait failed");
        conn.reset();
        ready_tx.send(()).expect("sender hung up");

        let mut out2 = Vec::new();
        for _ in 0..10_000 {
            if out2.len() == l2 {
                break;
            }
            match conn.recv(&mut chunk) {
                Ok(n) => out2.extend_from_slice(&chunk[..n]),
                Err(e) => panic!("recv failed: {e}"),
            }
        }
        conn.wait(200).expect("wait failed");
        (out, out2)
    });

    tx.join().expect("sender thread panicked");
    let (out, out2) = rx.join().expect("receiver thread panicked");
    assert_eq!(out, first);
    assert_eq!(out2, second);
}
