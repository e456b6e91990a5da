use keygraph::{detect_events, evaluate, Config, Corpus, Document};
use tracing_subscriber::EnvFilter;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    // RUST_LOG=keygraph=debug shows every split decision.
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    // Two storylines sharing one keyword ("coast") through a pair of
    // cross-over reports.
    let storm = ["storm", "flood", "rain", "evacuation", "coast"];
    let vote = ["election", "ballot", "turnout", "candidate", "poll"];

    let mut docs = Vec::new();
    for i in 0..4 {
        docs.push(story(&format!("storm-{i}"), "weather", "Storm floods the coast", &storm));
        docs.push(story(&format!("vote-{i}"), "politics", "Turnout surges at polls", &vote));
    }
    docs.push(story("mix-0", "weather", "Coastal towns delay election", &["coast", "election"]));
    docs.push(story("mix-1", "politics", "Ballot boxes moved inland", &["coast", "election"]));
    let corpus = Corpus::from_documents(docs);

    let config = Config::new()
        .with_min_edge_df(2)
        .with_min_cluster_node_size(3)
        .with_min_topic_size(2)
        .with_refine_key_graphs(true);

    let events = detect_events(&corpus, &config)?;
    for event in &events {
        println!("{event}");
    }

    let scores = evaluate(&events, &corpus);
    println!(
        "events={} purity={:.3} nmi={:.3} assigned={} unassigned={}",
        events.len(),
        scores.purity,
        scores.nmi,
        scores.assigned,
        scores.unassigned
    );
    Ok(())
}

fn story(id: &str, topic: &str, title: &str, terms: &[&str]) -> Document {
    terms.iter().fold(
        Document::new(id).with_title(title).with_topic(topic),
        |doc, term| doc.with_keyword(term, 1.0),
    )
}
