//! End-to-end tests of the scrape pipeline (parse, relabel, serialize)
//!
//! Runs realistic cAdvisor output through `render_scrape` with tables
//! decoded from topology service JSON.

use cadvisor_relabel::exposition::{TimestampFormat, parse};
use cadvisor_relabel::mapping::{MappingTable, TopologyResponse};
use cadvisor_relabel::relabel::{ScrapeOutcome, relabel, render_scrape};

const R1_TABLE: &str = r#"{"tp_name_table": {"r1": {"eth0.0": {"l3_model": "Gi0/0/0"}}}}"#;

fn table(json: &str) -> MappingTable {
    TopologyResponse::from_json(json).expect("test table should decode")
}

const SINGLE_RECEIVE: &str = "# HELP container_network_receive_bytes Cumulative count of bytes received\n\
# TYPE container_network_receive_bytes counter\n\
container_network_receive_bytes{name=\"clab-emulated-r1\",interface=\"eth0\"} 1024";

// ─────────────────────────────────────────────────────────────────────────────
// Basic scenarios
// ─────────────────────────────────────────────────────────────────────────────

#[test]
fn test_matching_node_and_interface_is_rewritten() {
    let table = table(R1_TABLE);
    let output = render_scrape(SINGLE_RECEIVE, Some(&table), TimestampFormat::Legacy);

    assert_eq!(output.outcome, ScrapeOutcome::Relabeled);
    assert_eq!(output.report.rewritten, 1);
    assert_eq!(
        output.into_response_body(),
        "# HELP container_network_receive_bytes Cumulative count of bytes received\n\
         # TYPE container_network_receive_bytes counter\n\
         container_network_receive_bytes{name=\"clab-emulated-r1\",interface=\"Gi0/0/0\"} 1024\n\
         relabel_success 1"
    );
}

#[test]
fn test_empty_table_passes_input_through_with_failure_marker() {
    let table = table(r#"{"tp_name_table": {}}"#);
    let output = render_scrape(SINGLE_RECEIVE, Some(&table), TimestampFormat::Legacy);

    assert_eq!(output.outcome, ScrapeOutcome::Passthrough);
    assert_eq!(
        output.into_response_body(),
        format!("{}\nrelabel_success 0", SINGLE_RECEIVE)
    );
}

#[test]
fn test_no_table_passes_input_through_with_failure_marker() {
    let output = render_scrape(SINGLE_RECEIVE, None, TimestampFormat::Legacy);

    assert!(!output.report.mapping_available);
    assert_eq!(
        output.into_response_body(),
        format!("{}\nrelabel_success 0", SINGLE_RECEIVE)
    );
}

#[test]
fn test_empty_scrape_reports_failure_even_with_table() {
    let table = table(R1_TABLE);
    let output = render_scrape("", Some(&table), TimestampFormat::Legacy);
    assert_eq!(output.into_response_body(), "\nrelabel_success 0");
}

#[test]
fn test_malformed_scrape_yields_empty_body_and_failure_marker() {
    let table = table(R1_TABLE);
    let output = render_scrape(
        "container_network_receive_bytes{name=\"clab-emulated-r1\" 1024",
        Some(&table),
        TimestampFormat::Legacy,
    );

    assert_eq!(output.outcome, ScrapeOutcome::ParseError);
    assert_eq!(output.into_response_body(), "\nrelabel_success 0");
}

// ─────────────────────────────────────────────────────────────────────────────
// cAdvisor-shaped input
// ─────────────────────────────────────────────────────────────────────────────

const CADVISOR_SCRAPE: &str = r#"# HELP cadvisor_version_info A metric with a constant '1' value labeled by kernel version.
# TYPE cadvisor_version_info gauge
cadvisor_version_info{cadvisorRevision="8949c822",kernelVersion="5.15.0"} 1
# HELP container_network_receive_bytes_total Cumulative count of bytes received
# TYPE container_network_receive_bytes_total counter
container_network_receive_bytes_total{id="/docker/abc",interface="eth1",name="clab-emulated-r1"} 1.5e+06 1700000000123
container_network_receive_bytes_total{id="/docker/def",interface="eth1",name="clab-emulated-r2"} 42 1700000000123
container_network_receive_bytes_total{id="/docker/abc",interface="eth9",name="clab-emulated-r1"} 7 1700000000123
# HELP container_network_transmit_bytes_total Cumulative count of bytes transmitted
# TYPE container_network_transmit_bytes_total counter
container_network_transmit_bytes_total{id="/docker/abc",interface="eth2",name="clab-emulated-r1"} 2048 1700000000123
# HELP container_network_receive_errors_total Cumulative count of errors encountered while receiving
# TYPE container_network_receive_errors_total counter
container_network_receive_errors_total{id="/docker/abc",interface="eth1",name="clab-emulated-r1"} 0 1700000000123
"#;

const CADVISOR_TABLE: &str = r#"{
  "tp_name_table": {
    "r1": {
      "eth1.0": {"l3_model": "GigabitEthernet0/0/0", "l1_agent": "Ethernet1"},
      "eth2.0": {"l3_model": "GigabitEthernet0/0/1", "l1_agent": "Ethernet2"}
    }
  },
  "other_table": {}
}"#;

#[test]
fn test_cadvisor_counters_are_relabeled_by_canonical_family_name() {
    let table = table(CADVISOR_TABLE);
    let output = render_scrape(CADVISOR_SCRAPE, Some(&table), TimestampFormat::Millis);

    assert_eq!(output.outcome, ScrapeOutcome::Relabeled);
    assert_eq!(output.report.rewritten, 2);
    // r2 is not in the table and eth9.0 is not in r1's map
    assert_eq!(output.report.passed_through, 2);

    let body = output.into_response_body();
    assert!(body.contains(
        "container_network_receive_bytes_total{id=\"/docker/abc\",interface=\"GigabitEthernet0/0/0\",name=\"clab-emulated-r1\"} 1500000 1700000000123"
    ));
    assert!(body.contains(
        "container_network_receive_bytes_total{id=\"/docker/def\",interface=\"eth1\",name=\"clab-emulated-r2\"} 42 1700000000123"
    ));
    assert!(body.contains(
        "container_network_receive_bytes_total{id=\"/docker/abc\",interface=\"eth9\",name=\"clab-emulated-r1\"} 7 1700000000123"
    ));
    assert!(body.contains(
        "container_network_transmit_bytes_total{id=\"/docker/abc\",interface=\"GigabitEthernet0/0/1\",name=\"clab-emulated-r1\"} 2048 1700000000123"
    ));
    // Non-target family keeps the raw interface name
    assert!(body.contains(
        "container_network_receive_errors_total{id=\"/docker/abc\",interface=\"eth1\",name=\"clab-emulated-r1\"} 0 1700000000123"
    ));
    assert!(body.ends_with("\nrelabel_success 1"));
}

#[test]
fn test_family_order_is_preserved() {
    let table = table(CADVISOR_TABLE);
    let body = render_scrape(CADVISOR_SCRAPE, Some(&table), TimestampFormat::Millis).body;

    let positions: Vec<usize> = [
        "# TYPE cadvisor_version_info",
        "# TYPE container_network_receive_bytes ",
        "# TYPE container_network_transmit_bytes ",
        "# TYPE container_network_receive_errors ",
    ]
    .iter()
    .map(|needle| body.find(needle).expect("family should be present"))
    .collect();

    assert!(positions.windows(2).all(|w| w[0] < w[1]));
}

#[test]
fn test_legacy_timestamps_drop_the_decimal_point() {
    let input = "# TYPE foo gauge\nfoo 1 1700000000120";
    let output = render_scrape(input, None, TimestampFormat::Legacy);
    assert_eq!(output.body, "# HELP foo\n# TYPE foo gauge\nfoo 1 170000000012");
}

#[test]
fn test_node_name_without_prefix_is_used_verbatim() {
    let input = "# TYPE container_network_transmit_bytes counter\n\
                 container_network_transmit_bytes{name=\"r1\",interface=\"eth0\"} 5";
    let table = table(R1_TABLE);
    let output = render_scrape(input, Some(&table), TimestampFormat::Legacy);
    assert!(output.body.ends_with("{name=\"r1\",interface=\"Gi0/0/0\"} 5"));
}

#[test]
fn test_lookup_is_case_sensitive() {
    let input = "# TYPE container_network_transmit_bytes counter\n\
                 container_network_transmit_bytes{name=\"clab-emulated-R1\",interface=\"eth0\"} 5";
    let table = table(R1_TABLE);
    let output = render_scrape(input, Some(&table), TimestampFormat::Legacy);
    assert_eq!(output.report.rewritten, 0);
    assert!(output.body.contains("interface=\"eth0\""));
}

// ─────────────────────────────────────────────────────────────────────────────
// Properties
// ─────────────────────────────────────────────────────────────────────────────

mod properties {
    use super::*;
    use proptest::prelude::*;

    fn label_value() -> impl Strategy<Value = String> {
        "[a-zA-Z0-9_/. -]{0,12}"
    }

    fn interface() -> impl Strategy<Value = String> {
        "eth[0-9]{1,2}"
    }

    fn exposition(
        family: &str,
        rows: &[(String, String, String, u32)],
    ) -> String {
        let mut text = format!("# HELP {} doc\n# TYPE {} counter\n", family, family);
        for (node, iface, extra, value) in rows {
            text.push_str(&format!(
                "{}{{name=\"clab-emulated-{}\",interface=\"{}\",id=\"{}\"}} {}\n",
                family, node, iface, extra, value
            ));
        }
        text
    }

    fn mapping_for(nodes: &[String], interfaces: &[String]) -> MappingTable {
        let mut table = MappingTable::new();
        for node in nodes {
            for iface in interfaces {
                table.insert(node.clone(), format!("{}.0", iface), format!("model-{}", iface));
            }
        }
        table
    }

    proptest! {
        #[test]
        fn non_target_families_are_never_changed(
            rows in prop::collection::vec(("r[0-9]", interface(), label_value(), any::<u32>()), 1..8),
        ) {
            let text = exposition("container_network_receive_packets", &rows);
            let nodes: Vec<String> = rows.iter().map(|r| r.0.clone()).collect();
            let ifaces: Vec<String> = rows.iter().map(|r| r.1.clone()).collect();
            let table = mapping_for(&nodes, &ifaces);

            let original = parse(&text).expect("generated text should parse");
            let mut relabeled = original.clone();
            let report = relabel(&mut relabeled, Some(&table));

            prop_assert_eq!(report.rewritten, 0);
            prop_assert_eq!(relabeled, original);
        }

        #[test]
        fn unknown_nodes_are_never_changed(
            rows in prop::collection::vec(("r[0-9]", interface(), label_value(), any::<u32>()), 1..8),
        ) {
            let text = exposition("container_network_transmit_bytes", &rows);
            let ifaces: Vec<String> = rows.iter().map(|r| r.1.clone()).collect();
            let table = mapping_for(&["not-a-node".to_string()], &ifaces);

            let original = parse(&text).expect("generated text should parse");
            let mut relabeled = original.clone();
            relabel(&mut relabeled, Some(&table));

            prop_assert_eq!(relabeled, original);
        }

        #[test]
        fn matched_samples_change_only_the_interface_label(
            rows in prop::collection::vec(("r[0-9]", interface(), label_value(), any::<u32>()), 1..8),
        ) {
            let text = exposition("container_network_receive_bytes", &rows);
            let nodes: Vec<String> = rows.iter().map(|r| r.0.clone()).collect();
            let ifaces: Vec<String> = rows.iter().map(|r| r.1.clone()).collect();
            let table = mapping_for(&nodes, &ifaces);

            let original = parse(&text).expect("generated text should parse");
            let mut relabeled = original.clone();
            let report = relabel(&mut relabeled, Some(&table));
            prop_assert_eq!(report.rewritten, rows.len());

            let before = &original[0].samples;
            let after = &relabeled[0].samples;
            prop_assert_eq!(before.len(), after.len());
            for (b, a) in before.iter().zip(after.iter()) {
                prop_assert_eq!(&a.name, &b.name);
                prop_assert_eq!(a.value, b.value);
                prop_assert_eq!(a.labels.get("name"), b.labels.get("name"));
                prop_assert_eq!(a.labels.get("id"), b.labels.get("id"));
                let expected = format!("model-{}", b.labels.get("interface").unwrap_or_default());
                prop_assert_eq!(a.labels.get("interface"), Some(expected.as_str()));
            }
        }

        #[test]
        fn interfaces_missing_from_the_node_map_are_never_changed(
            rows in prop::collection::vec(("r[0-9]", interface(), label_value(), any::<u32>()), 1..8),
        ) {
            let text = exposition("container_network_receive_bytes", &rows);
            let nodes: Vec<String> = rows.iter().map(|r| r.0.clone()).collect();
            // Every node is known, but under an interface no sample carries
            let table = mapping_for(&nodes, &["ens99".to_string()]);

            let original = parse(&text).expect("generated text should parse");
            let mut relabeled = original.clone();
            let report = relabel(&mut relabeled, Some(&table));

            prop_assert_eq!(report.rewritten, 0);
            prop_assert_eq!(relabeled, original);
        }
    }
}
