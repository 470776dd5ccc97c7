//! What a person watching the terminal sees

use std::time::Duration;

use pingwatch::monitor::scheduler::MonitorHandle;

use crate::helpers::*;

#[tokio::test]
async fn test_all_clear_cycle_output() {
    let console = SharedBuffer::new();

    let handle = MonitorHandle::spawn_with(
        create_test_config(&["A", "B"], Duration::from_secs(1)),
        ScriptedProber::new(),
        RecordingNotifier::new(),
        console.reporter(),
        |monitor| monitor.max_cycles(2),
    );
    handle.join().await.unwrap();

    let text = console.text();
    let lines: Vec<&str> = text.lines().collect();

    assert_eq!(lines[0], "");
    assert_eq!(lines[1], "=".repeat(40));
    assert!(lines[2].starts_with("Checking connectivity at "));
    // HH:MM:SS
    let time = lines[2].trim_start_matches("Checking connectivity at ");
    assert_eq!(time.len(), 8);
    assert_eq!(time.matches(':').count(), 2);
    assert_eq!(lines[3], "All hosts are reachable.");
    assert_eq!(lines[4], "Waiting 1 second... (Ctrl+C to exit)");

    assert_eq!(text.matches("All hosts are reachable.").count(), 2);
    // no waiting line after the last cycle
    assert_eq!(text.matches("Waiting").count(), 1);
    assert!(!text.contains("Monitoring stopped by user."));
}

#[tokio::test]
async fn test_down_hosts_output() {
    let console = SharedBuffer::new();

    let handle = MonitorHandle::spawn_once(
        create_test_config(&["A", "B", "C"], Duration::from_secs(300)),
        ScriptedProber::new().down("A").down("C"),
        RecordingNotifier::new(),
        console.reporter(),
    );
    handle.join().await.unwrap();

    let text = console.text();
    assert!(text.contains("The following hosts are unreachable:\nA\nC\n"));
    assert!(text.contains("Notification sent: Connectivity Alert - A, C"));
    assert!(!text.contains("All hosts are reachable."));
}

#[tokio::test]
async fn test_unsupported_platform_warns_and_keeps_checking() {
    let console = SharedBuffer::new();

    let handle = MonitorHandle::spawn_with(
        create_test_config(&["A"], Duration::from_millis(10)),
        ScriptedProber::new().down("A"),
        RecordingNotifier::new().unsupported_platform(),
        console.reporter(),
        |monitor| monitor.max_cycles(2),
    );
    let stats = handle.join().await.unwrap();

    let text = console.text();
    assert!(
        text.lines()
            .next()
            .unwrap()
            .starts_with("Warning: desktop notifications are built for Linux, running on ")
    );
    assert_eq!(text.matches("Warning: desktop notifications").count(), 1);
    assert_eq!(stats.cycles, 2);
    assert_eq!(stats.alerts_sent, 2);
}

#[tokio::test]
async fn test_supported_platform_has_no_warning() {
    let console = SharedBuffer::new();

    let handle = MonitorHandle::spawn_once(
        create_test_config(&["A"], Duration::from_secs(300)),
        ScriptedProber::new(),
        RecordingNotifier::new(),
        console.reporter(),
    );
    handle.join().await.unwrap();

    assert!(!console.text().contains("Warning:"));
}
