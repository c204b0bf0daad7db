//! Flat text report over a decoded pprof profile.
//!
//! Mirrors the `text` report of the pprof tool: every sample weight is
//! attributed to the function of its leaf frame (flat) and to every
//! distinct function on its stack (cum). Functions are aggregated by name.

use std::collections::{HashMap, HashSet};

use onos_exporter_api::pprof::{Location, Profile};

use crate::error::{ExporterError, Result};

/// Report settings.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ReportOptions {
    /// Sample type to report on, e.g. `inuse_space`. `None` selects the
    /// profile's default sample type.
    pub sample_index: Option<String>,
    /// Nodes whose cumulative weight is below this fraction of the total
    /// are dropped.
    pub node_fraction: f64,
}

/// One line of the report.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextItem {
    pub name: String,
    pub flat: i64,
    pub cum: i64,
}

#[derive(Default)]
struct Node {
    flat: i64,
    cum: i64,
}

/// Generate the report items, heaviest flat first.
pub fn text_items(profile: &Profile, options: &ReportOptions) -> Result<Vec<TextItem>> {
    let index = sample_index(profile, options.sample_index.as_deref())?;

    let locations: HashMap<u64, &Location> = profile.location.iter().map(|l| (l.id, l)).collect();
    let functions: HashMap<u64, &str> = profile
        .function
        .iter()
        .map(|f| Ok((f.id, string(profile, f.name)?)))
        .collect::<Result<_>>()?;

    let mut nodes: HashMap<String, Node> = HashMap::new();
    let mut total: u64 = 0;

    for sample in &profile.sample {
        let value = *sample.value.get(index).ok_or_else(|| {
            ExporterError::profile(format!(
                "sample has {} values, expected at least {}",
                sample.value.len(),
                index + 1
            ))
        })?;
        if value == 0 {
            continue;
        }
        total = total.saturating_add(value.unsigned_abs());

        let mut seen = HashSet::new();
        for (depth, location_id) in sample.location_id.iter().enumerate() {
            let location = locations.get(location_id).ok_or_else(|| {
                ExporterError::profile(format!("sample references unknown location {}", location_id))
            })?;

            for (line_index, name) in frame_names(location, &functions).into_iter().enumerate() {
                let node = nodes.entry(name.clone()).or_default();
                if depth == 0 && line_index == 0 {
                    node.flat = node.flat.saturating_add(value);
                }
                if seen.insert(name) {
                    node.cum = node.cum.saturating_add(value);
                }
            }
        }
    }

    let cutoff = (options.node_fraction * total as f64) as u64;

    let mut items: Vec<TextItem> = nodes
        .into_iter()
        .filter(|(_, node)| node.cum.unsigned_abs() >= cutoff)
        .map(|(name, node)| TextItem {
            name,
            flat: node.flat,
            cum: node.cum,
        })
        .collect();

    items.sort_by(|a, b| {
        b.flat
            .unsigned_abs()
            .cmp(&a.flat.unsigned_abs())
            .then_with(|| b.cum.unsigned_abs().cmp(&a.cum.unsigned_abs()))
            .then_with(|| a.name.cmp(&b.name))
    });

    Ok(items)
}

/// Resolve the sample value index to report on.
fn sample_index(profile: &Profile, name: Option<&str>) -> Result<usize> {
    if profile.sample_type.is_empty() {
        return Err(ExporterError::profile("profile has no sample types"));
    }

    let type_name = |i: usize| string(profile, profile.sample_type[i].r#type);

    if let Some(name) = name {
        for i in 0..profile.sample_type.len() {
            if type_name(i)? == name {
                return Ok(i);
            }
        }
        return Err(ExporterError::profile(format!(
            "sample index {} not found in profile",
            name
        )));
    }

    if profile.default_sample_type != 0 {
        if let Some(i) = profile
            .sample_type
            .iter()
            .position(|st| st.r#type == profile.default_sample_type)
        {
            return Ok(i);
        }
    }

    Ok(profile.sample_type.len() - 1)
}

/// Function names of a location, innermost inlined frame first.
///
/// Locations without line information are named by their address.
fn frame_names(location: &Location, functions: &HashMap<u64, &str>) -> Vec<String> {
    let names: Vec<String> = location
        .line
        .iter()
        .filter_map(|line| functions.get(&line.function_id))
        .map(|name| name.to_string())
        .collect();

    if names.is_empty() {
        vec![format!("{:016x}", location.address)]
    } else {
        names
    }
}

fn string(profile: &Profile, index: i64) -> Result<&str> {
    usize::try_from(index)
        .ok()
        .and_then(|i| profile.string_table.get(i))
        .map(String::as_str)
        .ok_or_else(|| ExporterError::profile(format!("string index {} out of range", index)))
}

/// Build a profile with one location per distinct function name.
///
/// Stacks are listed leaf first.
#[cfg(test)]
pub(crate) fn build_profile(sample_types: &[&str], samples: &[(&[&str], &[i64])]) -> Profile {
    use onos_exporter_api::pprof::{Function, Line, Sample, ValueType};

    fn intern(strings: &mut Vec<String>, s: &str) -> i64 {
        match strings.iter().position(|existing| existing == s) {
            Some(i) => i as i64,
            None => {
                strings.push(s.to_string());
                (strings.len() - 1) as i64
            }
        }
    }

    let mut strings = vec![String::new()];
    let mut profile = Profile::default();

    for st in sample_types {
        let r#type = intern(&mut strings, st);
        let unit = intern(&mut strings, "count");
        profile.sample_type.push(ValueType { r#type, unit });
    }

    let mut ids: HashMap<String, u64> = HashMap::new();
    for (stack, values) in samples {
        let mut location_id = Vec::new();
        for name in stack.iter() {
            let id = match ids.get(*name) {
                Some(id) => *id,
                None => {
                    let id = ids.len() as u64 + 1;
                    let name_index = intern(&mut strings, name);
                    profile.function.push(Function {
                        id,
                        name: name_index,
                        system_name: name_index,
                        ..Default::default()
                    });
                    profile.location.push(Location {
                        id,
                        address: 0x1000 * id,
                        line: vec![Line {
                            function_id: id,
                            line: 1,
                        }],
                        ..Default::default()
                    });
                    ids.insert(name.to_string(), id);
                    id
                }
            };
            location_id.push(id);
        }
        profile.sample.push(Sample {
            location_id,
            value: values.to_vec(),
            ..Default::default()
        });
    }

    profile.string_table = strings;
    profile
}
