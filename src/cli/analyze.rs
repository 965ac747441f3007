use crate::analyze::{analyze_file, Analytics};
use std::path::Path;
use std::time::{Duration, Instant};

pub async fn analyze(path: &Path, threads: Option<usize>) -> Result<(), Box<dyn std::error::Error>> {
    let threads = threads.unwrap_or_else(|| {
        std::thread::available_parallelism()
            .map(|n| n.get())
            .unwrap_or(4)
    });

    println!("Starting analysis with {} threads...", threads);

    let started = Instant::now();
    let analytics = analyze_file(path, threads).await?;
    print_report(&analytics, started.elapsed());

    Ok(())
}

fn print_report(analytics: &Analytics, elapsed: Duration) {
    println!("\n--- Log Analysis Report ---");
    println!("Processing Time: {:.2} seconds", elapsed.as_secs_f64());
    println!("---------------------------------");
    println!("Total Requests Processed: {}", analytics.total_lines);
    println!("Total Errors: {}", analytics.error_count);
    println!("Total Warnings: {}", analytics.warning_count);
    if analytics.malformed > 0 {
        println!("Malformed Lines: {}", analytics.malformed);
    }

    if analytics.total_lines > 0 {
        println!("Error Rate: {:.2}%", analytics.error_rate());
        println!(
            "Average Response Time: {:.2} ms",
            analytics.average_response_time_ms()
        );
    }

    println!("\n--- HTTP Status Codes ---");
    for (code, count) in &analytics.status_codes {
        println!("  {}: {} requests", code, count);
    }

    println!("\n--- HTTP Method Distribution ---");
    for (method, count) in &analytics.methods {
        println!("  {}: {} requests", method, count);
    }
    println!("---------------------------------");
}
