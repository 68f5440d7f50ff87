//! Interface relabeling for container network metrics

use crate::exposition::MetricFamily;
use crate::mapping::MappingTable;

/// Families whose `interface` label is rewritten
pub const TARGET_METRICS: [&str; 2] = [
    "container_network_receive_bytes",
    "container_network_transmit_bytes",
];

/// Prefix containerlab puts in front of node names
pub const NODE_NAME_PREFIX: &str = "clab-emulated-";

/// Suffix turning a container interface into its emulated interface key
pub const EMULATED_INTERFACE_SUFFIX: &str = ".0";

const NODE_LABEL: &str = "name";
const INTERFACE_LABEL: &str = "interface";

/// What a relabel pass did
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RelabelReport {
    /// A mapping table was available for this pass
    pub mapping_available: bool,
    /// Target samples whose interface label was rewritten
    pub rewritten: usize,
    /// Target samples left untouched because no mapping matched
    pub passed_through: usize,
}

/// Rewrite `interface` labels of the target families in place
///
/// Without a table nothing is touched. Otherwise, for every sample of a
/// target family, the node is looked up by the `name` label (minus the
/// containerlab prefix) and the interface by `<interface>.0`; when both
/// match, the interface label takes the entry's `l3_model`. Anything that
/// does not match, including samples lacking either label, is passed
/// through unchanged.
pub fn relabel(families: &mut [MetricFamily], table: Option<&MappingTable>) -> RelabelReport {
    let Some(table) = table else {
        tracing::debug!("No mapping table loaded, passing metrics through unchanged");
        return RelabelReport::default();
    };

    let mut report = RelabelReport {
        mapping_available: true,
        ..RelabelReport::default()
    };

    for family in families.iter_mut() {
        if !TARGET_METRICS.contains(&family.name.as_str()) {
            tracing::trace!(family = %family.name, "Skipped non-target family");
            continue;
        }

        tracing::debug!(
            family = %family.name,
            samples = family.samples.len(),
            "Relabeling family"
        );

        for sample in &mut family.samples {
            let found = lookup(
                table,
                sample.labels.get(NODE_LABEL),
                sample.labels.get(INTERFACE_LABEL),
            );
            let Some(l3_model) = found else {
                report.passed_through += 1;
                continue;
            };

            if let Some(previous) = sample.labels.replace(INTERFACE_LABEL, l3_model) {
                tracing::debug!(
                    node = sample.labels.get(NODE_LABEL).unwrap_or_default(),
                    from = %previous,
                    to = %l3_model,
                    "Rewrote interface label"
                );
                report.rewritten += 1;
            }
        }
    }

    report
}

/// Resolve the real-world interface name for a sample's node and interface
fn lookup<'t>(
    table: &'t MappingTable,
    node_label: Option<&str>,
    interface: Option<&str>,
) -> Option<&'t str> {
    let node_label = node_label?;
    let node_name = node_label
        .strip_prefix(NODE_NAME_PREFIX)
        .unwrap_or(node_label);
    let interfaces = table.node(node_name)?;

    let emulated = format!("{}{}", interface?, EMULATED_INTERFACE_SUFFIX);
    interfaces
        .get(&emulated)
        .map(|entry| entry.l3_model.as_str())
}
