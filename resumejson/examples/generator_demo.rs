// Example demonstrating Generator writing through a tiny fixed output buffer

use resumejson::{from_str, to_string, Generator, Map, Variant};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();

    println!("Generator Demo - resumable output");
    println!("=================================");
    println!();

    let mut tags = Map::new();
    tags.insert("env", Variant::from("prod"));
    tags.insert("quote", Variant::from("say \"hi\"\n"));

    let mut doc = Map::new();
    doc.insert("name", Variant::from("gateway"));
    doc.insert("replicas", Variant::from(3));
    doc.insert("ratio", Variant::from(0.75));
    doc.insert("tags", Variant::from(tags));
    doc.insert(
        "ports",
        Variant::from(vec![Variant::from(80), Variant::from(443)]),
    );
    doc.insert("owner", Variant::Null);
    let doc = Variant::from(doc);

    let mut generator = Generator::new(&doc);
    let mut buf = [0u8; 7];
    let mut text = Vec::new();
    let mut calls = 0;
    while !generator.is_finished() {
        let n = generator.generate(&mut buf)?;
        calls += 1;
        println!("call {:>2}: {:?}", calls, String::from_utf8_lossy(&buf[..n]));
        text.extend_from_slice(&buf[..n]);
    }

    println!();
    println!("{} bytes in {} calls", generator.produced(), calls);
    println!("{}", String::from_utf8_lossy(&text));

    let reparsed: Variant = from_str(std::str::from_utf8(&text)?)?;
    assert_eq!(reparsed, doc);
    assert_eq!(to_string(&reparsed)?.as_bytes(), text.as_slice());
    println!("reparsed value matches");

    Ok(())
}
