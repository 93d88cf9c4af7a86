//! Console summaries for finished sessions and benchmarks.

use std::path::Path;

use contracts::BenchmarkSummary;
use session::SessionReport;

/// Print the end-of-session report
pub fn print_report(report: &SessionReport) {
    println!("\n╔══════════════════════════════════════════════════════════════╗");
    println!("║                    Session Statistics                        ║");
    println!("╚══════════════════════════════════════════════════════════════╝\n");

    println!("📊 Overview");
    println!("   ├─ Mode: {}", report.mode);
    println!("   ├─ Runtime: {:.2}s", report.runtime.as_secs_f64());
    println!("   ├─ Frames captured: {}", report.frames_captured);
    println!(
        "   ├─ Frames dropped: {} ({:.2}%)",
        report.frames_dropped,
        report.drop_rate()
    );
    println!("   ├─ Capture FPS: {:.2}", report.capture_fps());
    println!("   └─ Results applied: {}", report.results_applied);

    let s = &report.snapshot;
    println!("\n📈 Last Measurement Window");
    println!("   ├─ Frames: {} ({:.2} fps)", s.frames, s.fps);
    println!(
        "   ├─ Detections: {} ({:.2} per frame)",
        s.detections, s.avg_detections_per_frame
    );
    println!(
        "   └─ E2E latency: median {:.0} ms, p95 {:.0} ms, mean {:.1} ms",
        s.latency_median, s.latency_p95, s.latency_mean
    );

    println!("\n🔌 Relay");
    println!("   ├─ Connections: {}", report.connections);
    println!("   ├─ Reconnect attempts: {}", report.reconnects);
    println!("   └─ Server reports: {}", report.server_reports);

    if report.correlation_misses > 0 || report.duplicates > 0 {
        println!("\n⚠️  Uncorrelated Results");
        println!("   ├─ Unknown or evicted frames: {}", report.correlation_misses);
        println!("   └─ Duplicates: {}", report.duplicates);
    }

    println!();
}

/// Print a benchmark summary and where it was written
pub fn print_benchmark(summary: &BenchmarkSummary, export_path: &Path) {
    println!("\n=== Benchmark ({} s, {}) ===\n", summary.duration_seconds, summary.mode);
    println!("  Frames processed: {}", summary.frames_processed);
    println!("  Processed FPS:    {:.2}", summary.processed_fps);
    println!("  Detections:       {}", summary.total_detections);
    println!(
        "  E2E latency:      median {:.0} ms, p95 {:.0} ms, mean {:.1} ms",
        summary.median_e2e_latency_ms, summary.p95_e2e_latency_ms, summary.mean_e2e_latency_ms
    );
    println!("\n  Exported to {}", export_path.display());
}
