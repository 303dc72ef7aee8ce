//! In-memory database fixtures shared by unit tests, integration tests and
//! benchmarks.

#![allow(dead_code)]

use std::collections::HashMap;
use std::net::IpAddr;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Child {
    Empty,
    Node(usize),
    Leaf(usize),
}

/// Builds small but well-formed database files.
///
/// IPv4 networks are placed under `::ffff:0:0/96` unless the builder is
/// switched to the flat v4 layout.
pub struct DatabaseBuilder {
    fields: Vec<String>,
    languages: Vec<String>,
    ip_version: u16,
    build: u64,
    flat_v4: bool,
    nodes: Vec<[Child; 2]>,
    data: Vec<u8>,
    records: HashMap<String, usize>,
}

impl DatabaseBuilder {
    pub fn new(fields: &[&str], languages: &[&str]) -> Self {
        Self {
            fields: fields.iter().map(|f| f.to_string()).collect(),
            languages: languages.iter().map(|l| l.to_string()).collect(),
            ip_version: 1,
            build: 1_546_300_800,
            flat_v4: false,
            nodes: vec![[Child::Empty; 2]],
            // Data offset 0 would encode as pointer == node_count
            data: vec![0],
            records: HashMap::new(),
        }
    }

    pub fn with_ip_version(mut self, ip_version: u16) -> Self {
        self.ip_version = ip_version;
        self
    }

    pub fn with_build(mut self, build: u64) -> Self {
        self.build = build;
        self
    }

    /// Store IPv4 networks from the root instead of under the v4-in-v6 prefix.
    pub fn with_flat_v4(mut self) -> Self {
        self.flat_v4 = true;
        self
    }

    /// Insert a network with values for every language, in language order.
    pub fn insert(&mut self, cidr: &str, values: &[&str]) {
        assert_eq!(
            values.len(),
            self.fields.len() * self.languages.len(),
            "one value per field per language"
        );
        let (addr, prefix_len) = cidr.split_once('/').expect("CIDR notation");
        let addr: IpAddr = addr.parse().expect("network address");
        let prefix_len: usize = prefix_len.parse().expect("prefix length");

        let (key, bits) = match addr {
            IpAddr::V4(v4) if self.flat_v4 => (v4.octets().to_vec(), prefix_len),
            IpAddr::V4(v4) => (v4.to_ipv6_mapped().octets().to_vec(), 96 + prefix_len),
            IpAddr::V6(v6) => (v6.octets().to_vec(), prefix_len),
        };
        assert!(bits > 0, "empty prefix");

        let record = self.record(&values.join("\t"));
        let mut node = 0;
        for i in 0..bits - 1 {
            let bit = bit_at(&key, i);
            node = match self.nodes[node][bit] {
                Child::Node(next) => next,
                existing => {
                    let next = self.nodes.len();
                    let inherited = match existing {
                        Child::Leaf(_) => existing,
                        _ => Child::Empty,
                    };
                    self.nodes.push([inherited; 2]);
                    self.nodes[node][bit] = Child::Node(next);
                    next
                }
            };
        }
        let last = bit_at(&key, bits - 1);
        self.nodes[node][last] = Child::Leaf(record);
    }

    fn record(&mut self, text: &str) -> usize {
        if let Some(&offset) = self.records.get(text) {
            return offset;
        }
        let offset = self.data.len();
        self.data
            .extend_from_slice(&(text.len() as u16).to_be_bytes());
        self.data.extend_from_slice(text.as_bytes());
        self.records.insert(text.to_string(), offset);
        offset
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// Metadata JSON describing the body produced by [`Self::body`].
    pub fn metadata_json(&self) -> String {
        let languages: serde_json::Map<String, serde_json::Value> = self
            .languages
            .iter()
            .enumerate()
            .map(|(i, lang)| (lang.clone(), serde_json::json!(i * self.fields.len())))
            .collect();
        serde_json::json!({
            "build": self.build,
            "ip_version": self.ip_version,
            "languages": languages,
            "node_count": self.nodes.len(),
            "total_size": self.body().len(),
            "fields": self.fields,
        })
        .to_string()
    }

    /// Node table followed by data section.
    pub fn body(&self) -> Vec<u8> {
        let node_count = self.nodes.len();
        let pointer = |child: Child| -> u32 {
            match child {
                Child::Empty => node_count as u32,
                Child::Node(next) => next as u32,
                Child::Leaf(offset) => (node_count + offset) as u32,
            }
        };

        let mut body = Vec::with_capacity(node_count * 8 + self.data.len());
        for [zero, one] in &self.nodes {
            body.extend_from_slice(&pointer(*zero).to_be_bytes());
            body.extend_from_slice(&pointer(*one).to_be_bytes());
        }
        body.extend_from_slice(&self.data);
        body
    }

    pub fn build(&self) -> Vec<u8> {
        assemble(&self.metadata_json(), &self.body())
    }
}

/// Length-prefixed metadata followed by `body`.
pub fn assemble(metadata_json: &str, body: &[u8]) -> Vec<u8> {
    let mut data = (metadata_json.len() as u32).to_be_bytes().to_vec();
    data.extend_from_slice(metadata_json.as_bytes());
    data.extend_from_slice(body);
    data
}

fn bit_at(bytes: &[u8], index: usize) -> usize {
    ((bytes[index / 8] >> (7 - index % 8)) & 1) as usize
}

pub const SAMPLE_FIELDS: [&str; 3] = ["country_name", "region_name", "city_name"];

/// Dual-stack database covering the well-known sample addresses.
pub fn sample_database() -> Vec<u8> {
    let mut builder = DatabaseBuilder::new(&SAMPLE_FIELDS, &["CN", "EN"]).with_ip_version(3);
    for (cidr, values) in SAMPLE_NETWORKS {
        builder.insert(cidr, &values);
    }
    builder.build()
}

pub const SAMPLE_NETWORKS: [(&str, [&str; 6]); 10] = [
    ("139.228.0.0/16", ["印度尼西亚", "雅加达", "雅加达", "Indonesia", "Jakarta", "Jakarta"]),
    ("27.56.0.0/13", ["印度", "德里", "", "India", "Delhi", ""]),
    ("89.158.0.0/15", ["法国", "法国", "", "France", "France", ""]),
    ("113.212.112.0/22", ["印度尼西亚", "印度尼西亚", "", "Indonesia", "Indonesia", ""]),
    ("182.0.0.0/12", ["印度尼西亚", "印度尼西亚", "", "Indonesia", "Indonesia", ""]),
    ("104.188.0.0/14", ["美国", "加利福尼亚州", "", "United States", "California", ""]),
    ("1.0.0.0/24", ["澳大利亚", "澳大利亚", "", "Australia", "Australia", ""]),
    ("2001:250::/32", ["中国", "北京", "北京", "China", "Beijing", "Beijing"]),
    ("2001:da8::/32", ["中国", "教育网", "", "China", "CERNET", ""]),
    ("2400:cb00::/32", ["美国", "美国", "", "United States", "United States", ""]),
];
