//! Plain-text rendering of an analysis report.

use aivis_analysis::AnalysisReport;

fn fmt_opt(value: Option<f64>, precision: usize) -> String {
    value.map_or_else(|| "-".to_string(), |v| format!("{v:.precision$}"))
}

pub(crate) fn print_report(report: &AnalysisReport) {
    println!();
    println!("AI visibility report for {} ({})", report.brand, report.industry);
    println!(
        "Run {}  generated {}",
        report.run_id,
        report.generated_at.format("%Y-%m-%d %H:%M:%S UTC")
    );
    println!(
        "Weights: mention rate {:.2}, position {:.2}, sentiment {:.2}  (sentiment scorer: {})",
        report.weights.mention_rate,
        report.weights.position,
        report.weights.sentiment,
        report.sentiment_scorer
    );
    if report.partial {
        println!("WARNING: run deadline elapsed; some calls were cut off and counted as timeouts");
    }

    println!();
    println!("Platforms:");
    for summary in &report.platform_summaries {
        let state = if summary.unavailable() { "unavailable" } else { "ok" };
        println!(
            "  {:<12} {:>3} ok  {:>3} failed  [{state}]",
            summary.platform.as_str(),
            summary.succeeded,
            summary.failed
        );
    }

    println!();
    println!(
        "  {:<20} {:<12} {:>8} {:>8} {:>9} {:>8}",
        "entity", "platform", "rate", "avg pos", "sentiment", "score"
    );
    for row in &report.scores {
        if row.insufficient_data {
            println!(
                "  {:<20} {:<12} {:>8} {:>8} {:>9} {:>8}",
                row.entity,
                row.platform.as_str(),
                "n/a",
                "-",
                "-",
                "n/a"
            );
        } else {
            println!(
                "  {:<20} {:<12} {:>7.0}% {:>8} {:>9} {:>8.1}",
                row.entity,
                row.platform.as_str(),
                row.mention_rate * 100.0,
                fmt_opt(row.avg_position, 1),
                fmt_opt(row.avg_sentiment, 2),
                row.weighted_score
            );
        }
    }

    println!();
    println!("Composite:");
    for c in &report.composite {
        if c.insufficient_data {
            println!("  {:<20} insufficient data", c.entity);
        } else {
            println!(
                "  {:<20} {:>6.1}  ({} platform(s))",
                c.entity, c.score, c.platforms_with_data
            );
        }
    }
    match report.competitive_rank {
        Some(rank) => println!(
            "  {} ranks #{rank} of {}",
            report.brand,
            report.competitors.len() + 1
        ),
        None => println!("  {} could not be ranked", report.brand),
    }
    if let Some(position) = report.market_position {
        println!("  Market position: {position}");
    }

    if !report.platform_comparisons.is_empty() {
        println!();
        println!("Against competitors:");
        for c in &report.platform_comparisons {
            println!(
                "  {:<12} {:>3} vs avg {:>5.1}  [{}]",
                c.platform.as_str(),
                c.brand_mentions,
                c.avg_competitor_mentions,
                c.standing
            );
        }
    }

    if !report.insights.is_empty() {
        println!();
        println!("Insights:");
        for line in &report.insights {
            println!("  - {line}");
        }
    }

    println!();
    println!("Recommendations:");
    for line in &report.recommendations {
        println!("  - {line}");
    }
}
