// Example demonstrating PushParser filling a typed record from network-sized chunks

use resumejson::{record, ParseError, ParserState, PushParser, ValueRef, Variant};

record! {
    #[derive(Debug)]
    pub struct Order {
        pub id: u64,
        pub customer: String,
        pub lines: Vec<Line>,
        pub note: Option<String>,
    }
    extras: Variant
}

record! {
    #[derive(Debug)]
    pub struct Line {
        pub sku: String,
        pub qty: u32,
        pub price: f64,
    }
}

fn main() -> Result<(), ParseError> {
    env_logger::init();

    println!("PushParser Demo - resumable typed parsing");
    println!("=========================================");
    println!();

    // Chunk boundaries fall inside names, strings, numbers and escapes.
    let chunks: [&[u8]; 6] = [
        br#"{"id": 10"#,
        br#"42, "custo"#,
        br#"mer": "Zo\u00eb", "lin"#,
        br#"es": [{"sku": "A-1", "qty": 2, "price": 9.9"#,
        br#"9}, {"sku": "B-7", "qty": 1, "price": 120}], "#,
        br#""channel": "web"}"#,
    ];

    let mut parser = PushParser::<Order>::new();
    for (i, chunk) in chunks.iter().enumerate() {
        parser.feed(chunk)?;
        println!(
            "chunk {}: {:>2} bytes -> state {:?}, {} live frames",
            i + 1,
            chunk.len(),
            parser.state(),
            parser.depth()
        );
    }
    assert_eq!(parser.state(), ParserState::Finished);
    let order = parser.finish()?;

    println!();
    println!("order {} for {}", order.id, order.customer);
    for line in &order.lines {
        println!("  {} x{} @ {}", line.sku, line.qty, line.price);
    }
    println!("note present: {}", order.note.is_some());

    let view = ValueRef::new(&order);
    println!();
    println!("members:");
    for (name, value) in view.iter() {
        println!("  {:<10} {:?}", name, value.json_type());
    }
    println!(
        "/lines/1/sku = {:?}",
        view.resolve_path("/lines/1/sku").and_then(|v| v.as_str())
    );
    println!(
        "/channel     = {:?}",
        view.resolve_path("/channel").and_then(|v| v.as_str())
    );

    println!();
    println!("abandoning a parse half way:");
    let mut partial = PushParser::<Order>::new();
    partial.feed(br#"{"id": 1, "lines": [{"sku": "#)?;
    println!("  {} live frames released", partial.depth());
    partial.destroy();

    Ok(())
}
