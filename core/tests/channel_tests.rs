//! Tests for channel membership, modes and channel-scoped commands

mod common;

use chanrelay_core::*;
use common::*;

#[test]
fn test_join_creates_channel_with_operator() {
    let mut server = server();
    let mut alice = register(&mut server, "alice");

    send(&mut server, &alice, "JOIN #x");
    assert_eq!(
        alice.drain(),
        vec![
            ":alice!a@127.0.0.1 JOIN :#x",
            ":irc.test 353 alice = #x :@alice",
            ":irc.test 366 alice #x :End of NAMES list",
        ]
    );

    let channel = server.channels().get("#x").unwrap();
    assert_eq!(channel.member_count(), 1);
    assert!(channel.is_operator(&alice.id));
    assert!(server.registry().get(&alice.id).unwrap().channels.contains("#x"));
}

#[test]
fn test_second_join_notifies_members() {
    let mut server = server();
    let mut alice = register_in(&mut server, "alice", &["#x"]);
    let mut bob = register(&mut server, "bob");

    send(&mut server, &bob, "JOIN #x");
    assert_eq!(alice.drain(), vec![":bob!b@127.0.0.1 JOIN :#x"]);
    assert_eq!(
        bob.drain(),
        vec![
            ":bob!b@127.0.0.1 JOIN :#x",
            ":irc.test 353 bob = #x :@alice bob",
            ":irc.test 366 bob #x :End of NAMES list",
        ]
    );
}

#[test]
fn test_join_existing_member_is_silent() {
    let mut server = server();
    let mut alice = register_in(&mut server, "alice", &["#x"]);

    send(&mut server, &alice, "JOIN #x");
    assert!(alice.drain().is_empty());
    assert_eq!(server.channels().get("#x").unwrap().member_count(), 1);
}

#[test]
fn test_join_sends_topic() {
    let mut server = server();
    let alice = register_in(&mut server, "alice", &["#x"]);
    send(&mut server, &alice, "TOPIC #x :hello there");
    let mut bob = register(&mut server, "bob");

    send(&mut server, &bob, "JOIN #x");
    let lines = bob.drain();
    assert_eq!(lines[1], ":irc.test 332 bob #x :hello there");
}

#[test]
fn test_join_list_and_bad_mask() {
    let mut server = server();
    let mut alice = register(&mut server, "alice");

    send(&mut server, &alice, "JOIN #a,bad,&b");
    let lines = alice.drain();
    assert!(lines.contains(&":irc.test 476 alice bad :Bad Channel Mask".to_string()));
    assert!(server.channels().contains("#a"));
    assert!(server.channels().contains("&b"));
    assert_eq!(server.channels().len(), 2);
}

#[test]
fn test_channel_names_are_case_sensitive() {
    let mut server = server();
    let _alice = register_in(&mut server, "alice", &["#Chan"]);
    let _bob = register_in(&mut server, "bob", &["#chan"]);
    assert_eq!(server.channels().len(), 2);
}

#[test]
fn test_user_limit() {
    let mut server = server();
    let mut alice = register_in(&mut server, "alice", &["#x"]);
    let mut carol = register(&mut server, "carol");

    send(&mut server, &alice, "MODE #x +l 1");
    assert_eq!(alice.drain(), vec![":alice!a@127.0.0.1 MODE #x +l 1"]);

    send(&mut server, &carol, "JOIN #x");
    assert_eq!(
        carol.drain(),
        vec![":irc.test 471 carol #x :Cannot join channel (+l)"]
    );

    send(&mut server, &alice, "MODE #x -l");
    assert_eq!(alice.drain(), vec![":alice!a@127.0.0.1 MODE #x -l"]);

    send(&mut server, &carol, "JOIN #x");
    assert_eq!(carol.drain()[0], ":carol!c@127.0.0.1 JOIN :#x");
    assert_eq!(server.channels().get("#x").unwrap().member_count(), 2);
}

#[test]
fn test_non_positive_limit_is_skipped() {
    let mut server = server();
    let mut alice = register_in(&mut server, "alice", &["#x"]);

    send(&mut server, &alice, "MODE #x +l 0");
    send(&mut server, &alice, "MODE #x +l -5");
    assert!(alice.drain().is_empty());
    assert!(!server.channels().get("#x").unwrap().has_mode('l'));
}

#[test]
fn test_invite_only_and_one_shot_invite() {
    let mut server = server();
    let mut alice = register_in(&mut server, "alice", &["#x"]);
    let mut carol = register(&mut server, "carol");

    send(&mut server, &alice, "MODE #x +i");
    alice.drain();

    send(&mut server, &carol, "JOIN #x");
    assert_eq!(
        carol.drain(),
        vec![":irc.test 473 carol #x :Cannot join channel (+i)"]
    );

    send(&mut server, &alice, "INVITE carol #x");
    assert_eq!(alice.drain(), vec![":irc.test 341 alice carol #x"]);
    assert_eq!(carol.drain(), vec![":alice!a@127.0.0.1 INVITE carol :#x"]);

    send(&mut server, &carol, "JOIN #x");
    assert_eq!(carol.drain()[0], ":carol!c@127.0.0.1 JOIN :#x");

    send(&mut server, &carol, "PART #x");
    carol.drain();
    send(&mut server, &carol, "JOIN #x");
    assert_eq!(
        carol.drain(),
        vec![":irc.test 473 carol #x :Cannot join channel (+i)"]
    );
}

#[test]
fn test_invite_errors() {
    let mut server = server();
    let mut alice = register_in(&mut server, "alice", &["#x"]);
    let mut bob = register_in(&mut server, "bob", &["#x"]);
    let _carol = register(&mut server, "carol");
    alice.drain();

    send(&mut server, &alice, "INVITE bob #x");
    send(&mut server, &alice, "INVITE nobody #x");
    send(&mut server, &alice, "INVITE carol #nope");
    assert_eq!(
        alice.drain(),
        vec![
            ":irc.test 443 alice bob #x :is already on channel",
            ":irc.test 401 alice nobody :No such nick/channel",
            ":irc.test 401 alice #nope :No such nick/channel",
        ]
    );

    send(&mut server, &alice, "MODE #x +i");
    bob.drain();
    send(&mut server, &bob, "INVITE carol #x");
    assert_eq!(
        bob.drain(),
        vec![":irc.test 482 bob #x :You're not channel operator"]
    );
}

#[test]
fn test_channel_key() {
    let mut server = server();
    let mut alice = register_in(&mut server, "alice", &["#x"]);
    let mut carol = register(&mut server, "carol");

    send(&mut server, &alice, "MODE #x +k pw");
    assert_eq!(alice.drain(), vec![":alice!a@127.0.0.1 MODE #x +k pw"]);

    send(&mut server, &carol, "JOIN #x");
    send(&mut server, &carol, "JOIN #x wrong");
    assert_eq!(
        carol.drain(),
        vec![
            ":irc.test 475 carol #x :Cannot join channel (+k)",
            ":irc.test 475 carol #x :Cannot join channel (+k)",
        ]
    );

    send(&mut server, &carol, "JOIN #x pw");
    assert_eq!(carol.drain()[0], ":carol!c@127.0.0.1 JOIN :#x");
}

#[test]
fn test_mode_query_is_operator_only() {
    let mut server = server();
    let mut alice = register_in(&mut server, "alice", &["#x"]);
    let mut bob = register_in(&mut server, "bob", &["#x"]);
    let mut eve = register(&mut server, "eve");
    alice.drain();

    send(&mut server, &alice, "MODE #x");
    assert_eq!(alice.drain(), vec![":irc.test 324 alice #x +"]);

    send(&mut server, &alice, "MODE #x +tkl hunter2 5");
    alice.drain();
    bob.drain();

    send(&mut server, &alice, "MODE #x");
    assert_eq!(alice.drain(), vec![":irc.test 324 alice #x +klt hunter2 5"]);

    send(&mut server, &bob, "MODE #x");
    assert_eq!(
        bob.drain(),
        vec![":irc.test 482 bob #x :You're not channel operator"]
    );

    send(&mut server, &eve, "MODE #x");
    assert_eq!(
        eve.drain(),
        vec![":irc.test 482 eve #x :You're not channel operator"]
    );
    send(&mut server, &eve, "JOIN #x");
    assert_eq!(
        eve.drain(),
        vec![":irc.test 475 eve #x :Cannot join channel (+k)"]
    );
    assert!(!server.channels().get("#x").unwrap().has_member(&eve.id));
}

#[test]
fn test_mode_canonical_broadcast() {
    let mut server = server();
    let mut alice = register_in(&mut server, "alice", &["#x"]);
    let mut bob = register_in(&mut server, "bob", &["#x"]);
    alice.drain();

    send(&mut server, &alice, "MODE #x +i+t-k+o bob");
    let expected = vec![":alice!a@127.0.0.1 MODE #x +it-k+o bob"];
    assert_eq!(alice.drain(), expected);
    assert_eq!(bob.drain(), expected);
    assert!(server.channels().get("#x").unwrap().is_operator(&bob.id));
}

#[test]
fn test_mode_requires_operator() {
    let mut server = server();
    let mut alice = register_in(&mut server, "alice", &["#x"]);
    let mut bob = register_in(&mut server, "bob", &["#x"]);
    alice.drain();

    send(&mut server, &bob, "MODE #x +i");
    assert_eq!(
        bob.drain(),
        vec![":irc.test 482 bob #x :You're not channel operator"]
    );
    assert!(alice.drain().is_empty());
    assert!(!server.channels().get("#x").unwrap().has_mode('i'));
}

#[test]
fn test_unknown_mode_char_continues() {
    let mut server = server();
    let mut alice = register_in(&mut server, "alice", &["#x"]);

    send(&mut server, &alice, "MODE #x +zt");
    assert_eq!(
        alice.drain(),
        vec![
            ":irc.test 472 alice z :is unknown mode char to me",
            ":alice!a@127.0.0.1 MODE #x +t",
        ]
    );
}

#[test]
fn test_operator_grant_requires_membership() {
    let mut server = server();
    let mut alice = register_in(&mut server, "alice", &["#x"]);
    let carol = register(&mut server, "carol");

    send(&mut server, &alice, "MODE #x +o carol");
    send(&mut server, &alice, "MODE #x +o nobody");
    assert!(alice.drain().is_empty());

    let channel = server.channels().get("#x").unwrap();
    assert!(!channel.is_operator(&carol.id));
    assert!(channel.operators().iter().all(|op| channel.has_member(op)));
}

#[test]
fn test_kick() {
    let mut server = server();
    let mut alice = register_in(&mut server, "alice", &["#x"]);
    let mut bob = register_in(&mut server, "bob", &["#x"]);
    alice.drain();

    send(&mut server, &alice, "KICK #x bob :bye");
    let expected = vec![":alice!a@127.0.0.1 KICK #x bob :bye"];
    assert_eq!(alice.drain(), expected);
    assert_eq!(bob.drain(), expected);

    let channel = server.channels().get("#x").unwrap();
    assert!(!channel.has_member(&bob.id));
    assert!(channel.has_member(&alice.id));
    assert!(!server.registry().get(&bob.id).unwrap().channels.contains("#x"));
}

#[test]
fn test_kick_last_member_destroys_channel() {
    let mut server = server();
    let mut alice = register_in(&mut server, "alice", &["#x"]);

    send(&mut server, &alice, "KICK #x alice :cleaning up");
    assert_eq!(
        alice.drain(),
        vec![":alice!a@127.0.0.1 KICK #x alice :cleaning up"]
    );
    assert!(!server.channels().contains("#x"));
    assert!(!server.registry().get(&alice.id).unwrap().channels.contains("#x"));
}

#[test]
fn test_kick_default_reason_and_errors() {
    let mut server = server();
    let mut alice = register_in(&mut server, "alice", &["#x"]);
    let mut bob = register_in(&mut server, "bob", &["#x"]);
    let _carol = register(&mut server, "carol");
    alice.drain();

    send(&mut server, &bob, "KICK #x alice");
    assert_eq!(
        bob.drain(),
        vec![":irc.test 482 bob #x :You're not channel operator"]
    );

    send(&mut server, &alice, "KICK #x carol");
    send(&mut server, &alice, "KICK #x");
    assert_eq!(
        alice.drain(),
        vec![
            ":irc.test 441 alice carol #x :They aren't on that channel",
            ":irc.test 461 alice KICK :Not enough parameters",
        ]
    );

    send(&mut server, &alice, "KICK #x bob");
    assert_eq!(bob.drain(), vec![":alice!a@127.0.0.1 KICK #x bob :alice"]);
}

#[test]
fn test_part_destroys_empty_channel() {
    let mut server = server();
    let mut alice = register_in(&mut server, "alice", &["#x"]);
    let mut bob = register_in(&mut server, "bob", &["#x"]);
    alice.drain();

    send(&mut server, &bob, "PART #x :later");
    assert_eq!(alice.drain(), vec![":bob!b@127.0.0.1 PART #x :later"]);
    assert_eq!(bob.drain(), vec![":bob!b@127.0.0.1 PART #x :later"]);

    send(&mut server, &alice, "PART #x");
    assert_eq!(alice.drain(), vec![":alice!a@127.0.0.1 PART #x"]);
    assert!(!server.channels().contains("#x"));

    send(&mut server, &alice, "PART #x");
    assert_eq!(
        alice.drain(),
        vec![":irc.test 401 alice #x :No such nick/channel"]
    );
}

#[test]
fn test_part_when_not_member() {
    let mut server = server();
    let _alice = register_in(&mut server, "alice", &["#x"]);
    let mut bob = register(&mut server, "bob");

    send(&mut server, &bob, "PART #x");
    assert_eq!(
        bob.drain(),
        vec![":irc.test 442 bob #x :You're not on that channel"]
    );
}

#[test]
fn test_topic() {
    let mut server = server();
    let mut alice = register_in(&mut server, "alice", &["#x"]);
    let mut bob = register_in(&mut server, "bob", &["#x"]);
    alice.drain();

    send(&mut server, &bob, "TOPIC #x");
    assert_eq!(bob.drain(), vec![":irc.test 331 bob #x :No topic is set"]);

    send(&mut server, &bob, "TOPIC #x :news");
    let expected = vec![":bob!b@127.0.0.1 TOPIC #x :news"];
    assert_eq!(alice.drain(), expected);
    assert_eq!(bob.drain(), expected);

    send(&mut server, &alice, "MODE #x +t");
    alice.drain();
    bob.drain();

    send(&mut server, &bob, "TOPIC #x :mine");
    assert_eq!(
        bob.drain(),
        vec![":irc.test 482 bob #x :You're not channel operator"]
    );
    send(&mut server, &bob, "TOPIC #x");
    assert_eq!(bob.drain(), vec![":irc.test 332 bob #x :news"]);

    send(&mut server, &alice, "TOPIC #x :");
    alice.drain();
    assert!(server.channels().get("#x").unwrap().topic.is_empty());
}

#[test]
fn test_channel_message_fanout() {
    let mut server = server();
    let mut alice = register_in(&mut server, "alice", &["#x"]);
    let mut bob = register_in(&mut server, "bob", &["#x"]);
    let mut carol = register(&mut server, "carol");
    alice.drain();

    send(&mut server, &alice, "PRIVMSG #x :hello all");
    assert!(alice.drain().is_empty());
    assert_eq!(bob.drain(), vec![":alice!a@127.0.0.1 PRIVMSG #x :hello all"]);

    send(&mut server, &carol, "PRIVMSG #x :let me in");
    assert_eq!(
        carol.drain(),
        vec![":irc.test 404 carol #x :Cannot send to channel"]
    );
    assert!(bob.drain().is_empty());
}

#[test]
fn test_quit_notifies_channel_peers_once() {
    let mut server = server();
    let mut alice = register_in(&mut server, "alice", &["#x", "#y"]);
    let bob = register_in(&mut server, "bob", &["#x", "#y"]);
    alice.drain();

    assert_eq!(send(&mut server, &bob, "QUIT :gone"), Disposition::Close);
    assert_eq!(alice.drain(), vec![":bob!b@127.0.0.1 QUIT :gone"]);
    assert!(!server.registry().contains(&bob.id));

    let x = server.channels().get("#x").unwrap();
    assert!(!x.has_member(&bob.id));
    assert_eq!(x.member_count(), 1);
}

#[test]
fn test_quit_last_member_destroys_channels() {
    let mut server = server();
    let alice = register_in(&mut server, "alice", &["#x"]);

    send(&mut server, &alice, "QUIT");
    assert!(server.channels().is_empty());
    assert_eq!(server.registry().len(), 0);
}
