//! Records queued before an export are always in that export, in order,
//! however the producer's timing jitters.

use std::thread;
use std::time::Duration;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use wav_recorder_core::processing::wav_format::float_to_pcm16;
use wav_recorder_core::{AudioFrame, Command, CommandChannel, RecorderSettings};

fn frame_value(index: usize) -> f32 {
    (index % 1000) as f32 / 1000.0
}

fn decode(bytes: &[u8]) -> Vec<i16> {
    bytes
        .chunks_exact(2)
        .map(|pair| i16::from_le_bytes([pair[0], pair[1]]))
        .collect()
}

#[test]
fn export_sees_every_prior_record_in_order() {
    for seed in 0..8u64 {
        let mut rng = StdRng::seed_from_u64(seed);
        let frame_count = rng.gen_range(1..200usize);
        let frame_len = rng.gen_range(1..8usize);

        let channel = CommandChannel::spawn().unwrap();
        let config = RecorderSettings {
            buffer_len: frame_len,
            ..Default::default()
        }
        .with_sample_rate(8000);
        channel.send(Command::Init { config }).unwrap();

        let sender = channel.sender();
        let producer = thread::spawn(move || {
            let mut rng = StdRng::seed_from_u64(seed.wrapping_mul(31).wrapping_add(7));
            for i in 0..frame_count {
                let frame = AudioFrame::mono(vec![frame_value(i); frame_len]);
                sender.send(Command::Record { frame }).unwrap();
                if rng.gen_bool(0.3) {
                    thread::sleep(Duration::from_micros(rng.gen_range(0..300)));
                }
            }
            sender.request_export("audio/wav").unwrap()
        });

        let blob = producer.join().unwrap().wait().unwrap();
        assert_eq!(blob.total_sample_count(), frame_count * frame_len, "seed {}", seed);

        let samples = decode(blob.pcm_data());
        assert_eq!(samples.len(), frame_count * frame_len);
        for (i, chunk) in samples.chunks(frame_len).enumerate() {
            let expected = float_to_pcm16(frame_value(i));
            assert!(chunk.iter().all(|&s| s == expected), "seed {} frame {}", seed, i);
        }
    }
}

#[test]
fn later_records_do_not_leak_into_earlier_export() {
    let channel = CommandChannel::spawn().unwrap();
    let config = RecorderSettings {
        buffer_len: 4,
        ..Default::default()
    }
    .with_sample_rate(8000);
    channel.send(Command::Init { config }).unwrap();

    let mut tickets = Vec::new();
    for round in 1..=5usize {
        channel
            .send(Command::Record {
                frame: AudioFrame::mono(vec![0.5; 4]),
            })
            .unwrap();
        tickets.push((round, channel.request_export("audio/wav").unwrap()));
    }

    // Resolve newest first; each ticket still gets its own snapshot.
    for (round, ticket) in tickets.into_iter().rev() {
        let blob = ticket.wait().unwrap();
        assert_eq!(blob.total_sample_count(), round * 4);
    }
}
