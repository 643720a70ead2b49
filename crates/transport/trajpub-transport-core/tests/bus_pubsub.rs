use trajpub_transport_core::{Bus, Message, Publisher, Transport, TransportError};

#[test]
fn subscribers_read_independently() {
    let bus = Bus::new();
    bus.init("sampler", false).unwrap();
    let publisher = bus.advertise("/robot/position", 100).unwrap();

    let mut early = bus.subscribe("/robot/position").unwrap();
    publisher.publish(Message::Vector(vec![1.0])).unwrap();

    let mut late = bus.subscribe("/robot/position").unwrap();
    publisher.publish(Message::Vector(vec![2.0])).unwrap();

    assert!(early.has_messages());
    assert_eq!(early.try_recv(), Some(Message::Vector(vec![1.0])));
    assert_eq!(early.try_recv(), Some(Message::Vector(vec![2.0])));
    assert_eq!(early.try_recv(), None);

    // Subscriptions only see messages published after they were opened.
    assert_eq!(late.drain(), vec![Message::Vector(vec![2.0])]);
    assert!(!late.has_messages());
}

#[test]
fn topics_are_isolated() {
    let bus = Bus::new();
    bus.init("sampler", false).unwrap();
    let a = bus.advertise("/a", 10).unwrap();
    let b = bus.advertise("/b", 10).unwrap();
    let mut sub_b = bus.subscribe("/b").unwrap();

    a.publish(Message::vector3(1.0, 2.0, 3.0)).unwrap();
    assert_eq!(sub_b.try_recv(), None);
    b.publish(Message::vector3(4.0, 5.0, 6.0)).unwrap();
    assert_eq!(sub_b.try_recv(), Some(Message::vector3(4.0, 5.0, 6.0)));

    assert_eq!(bus.topics(), vec!["/a".to_string(), "/b".to_string()]);
    assert_eq!(bus.latest("/a"), Some(Message::vector3(1.0, 2.0, 3.0)));
}

#[test]
fn re_advertising_yields_independent_handles() {
    let bus = Bus::new();
    bus.init("sampler", false).unwrap();
    let mut first = bus.advertise("/t", 10).unwrap();
    let second = bus.advertise("/t", 10).unwrap();
    assert_eq!(bus.publisher_count("/t"), 2);

    first.shutdown();
    assert_eq!(bus.publisher_count("/t"), 1);
    second.publish(Message::Vector(vec![0.0])).unwrap();
    assert_eq!(bus.publish_count("/t"), 1);

    drop(second);
    assert_eq!(bus.publisher_count("/t"), 0);
}

#[test]
fn invalid_topics_are_rejected() {
    let bus = Bus::new();
    bus.init("sampler", false).unwrap();
    let err = bus.advertise("/op_frame/left hand", 10).unwrap_err();
    assert!(matches!(err, TransportError::InvalidTopic(_)));
    assert!(bus.subscribe("").is_err());
}

#[test]
fn history_dumps_as_json() {
    let bus = Bus::new();
    bus.init("sampler", false).unwrap();
    let publisher = bus.advertise("/com/waist", 10).unwrap();
    publisher.publish(Message::vector3(0.0, 0.5, 1.0)).unwrap();

    let dump = bus.to_json();
    let entries = dump["/com/waist"].as_array().expect("topic entry");
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0]["source"], "sampler");
    assert_eq!(entries[0]["message"]["type"], "vector3");
}

#[test]
fn global_bus_is_shared() {
    let a = Bus::global();
    let b = Bus::global();
    a.init("global_test", false).unwrap();
    assert!(b.is_initialized());
}
