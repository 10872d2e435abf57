//! Performance benchmarks for chanrelay core

use chanrelay_core::*;
use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use std::time::Instant;
use tokio::sync::mpsc;
use uuid::Uuid;

fn benchmark_message_parsing(c: &mut Criterion) {
    let mut group = c.benchmark_group("message_parsing");

    let messages = vec![
        "NICK alice",
        "USER alice 0 * :Alice Wonderland",
        ":alice!user@host PRIVMSG #channel :Hello world",
        "JOIN #a,#b key1,key2",
        "MODE #channel +itkl-o key 10 bob",
        "QUIT :Leaving",
    ];

    for msg in messages {
        group.bench_with_input(BenchmarkId::from_parameter(msg), msg, |b, msg| {
            b.iter(|| Message::parse(black_box(msg)))
        });
    }

    group.finish();
}

fn benchmark_message_serialization(c: &mut Criterion) {
    let mut group = c.benchmark_group("message_serialization");

    let messages = vec![
        Message::new(MessageType::Pong, vec!["irc.test".to_string()]),
        Message::with_prefix(
            Prefix::User {
                nick: "alice".to_string(),
                user: "user".to_string(),
                host: "host".to_string(),
            },
            MessageType::PrivMsg,
            vec!["#channel".to_string(), "Hello world".to_string()],
        ),
        NumericReply::name_reply("irc.test", "alice", "#channel", "@alice bob carol"),
    ];

    for (i, msg) in messages.iter().enumerate() {
        group.bench_with_input(BenchmarkId::from_parameter(i), msg, |b, msg| {
            b.iter(|| msg.to_line())
        });
    }

    group.finish();
}

fn benchmark_framing(c: &mut Criterion) {
    let mut group = c.benchmark_group("framing");
    let chunk = b"PRIVMSG #channel :Hello world\r\nPING :abc\r\nJOIN #x\r\n";

    group.bench_function("whole_chunk", |b| {
        let mut queue = RecvQueue::new(8192);
        b.iter(|| queue.append(black_box(chunk)))
    });

    group.bench_function("byte_at_a_time", |b| {
        let mut queue = RecvQueue::new(8192);
        b.iter(|| {
            for byte in chunk.chunks(1) {
                let _ = queue.append(black_box(byte));
            }
        })
    });

    group.finish();
}

fn benchmark_channel_fanout(c: &mut Criterion) {
    let mut group = c.benchmark_group("channel_fanout");

    for members in [10usize, 100] {
        let mut config = Config::default();
        config.security.password = "secret".to_string();
        let mut server = Server::new(config);
        let mut receivers = Vec::new();
        let mut ids = Vec::new();

        for i in 0..members {
            let (tx, rx) = mpsc::unbounded_channel();
            let id = Uuid::new_v4();
            server.connection_opened(id, "127.0.0.1".to_string(), tx);
            for line in [
                "PASS secret".to_string(),
                format!("NICK u{}", i),
                format!("USER u{} 0 * :User", i),
                "JOIN #bench".to_string(),
            ] {
                server.handle_line(&id, &line, Instant::now());
            }
            receivers.push(rx);
            ids.push(id);
        }

        let sender = ids[0];
        group.bench_with_input(BenchmarkId::from_parameter(members), &members, |b, _| {
            b.iter(|| {
                server.handle_line(&sender, "PRIVMSG #bench :hello everyone", Instant::now());
                for rx in receivers.iter_mut() {
                    while rx.try_recv().is_ok() {}
                }
            })
        });
    }

    group.finish();
}

criterion_group!(
    benches,
    benchmark_message_parsing,
    benchmark_message_serialization,
    benchmark_framing,
    benchmark_channel_fanout,
);
criterion_main!(benches);
