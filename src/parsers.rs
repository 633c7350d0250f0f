//! Parsers for the free-text output of the host network utilities.
//!
//! Label matching is substring-based on purpose: utility output varies across
//! versions and locales, so a line matches if it contains the label anywhere.
//! Parsers never fail — missing or malformed fields keep their sentinel
//! defaults so every record comes out fully populated.

use crate::records::{ArpEntry, DiagStatus, InterfaceInfo, LookupResult, PingStats};

fn int_after_eq(segment: &str) -> Option<u32> {
    segment.split('=').nth(1).and_then(|s| s.trim().parse().ok())
}

/// Extract packet statistics from ping output. Last matching line wins for
/// every field; status is Success iff at least one reply came back.
pub fn parse_ping(output: &str) -> PingStats {
    let mut stats = PingStats::default();
    for line in output.lines() {
        if line.contains("Sent =") && line.contains("Received =") {
            for part in line.split(',') {
                let part = part.trim();
                if part.contains("Sent")
                    && let Some(n) = int_after_eq(part) { stats.transmitted = n; }
                if part.contains("Received")
                    && let Some(n) = int_after_eq(part) { stats.received = n; }
                if part.contains('%') && part.contains("loss") {
                    let before = part.split('%').next().unwrap_or("");
                    if let Some(tok) = before.split_whitespace().last() {
                        stats.loss = format!("{}%", tok.trim_matches(['(', ')']));
                    }
                }
            }
        }
        if line.contains("Average") {
            let tail = line.rsplit('=').next().unwrap_or(line);
            stats.avg_ms = tail.trim().trim_end_matches("ms").trim().to_string();
        }
    }
    if stats.received > 0 { stats.status = DiagStatus::Success; }
    stats
}

/// Extract the resolved address from nslookup output. The
/// "Non-authoritative answer" marker arms the scan; the first armed line with
/// a dotted "Address:" value wins and scanning stops.
pub fn parse_lookup(output: &str) -> LookupResult {
    let mut result = LookupResult::default();
    let mut armed = false;
    for line in output.lines() {
        if line.contains("Non-authoritative answer") { armed = true; }
        if armed && line.contains("Address:") {
            let value = line.split("Address:").nth(1).unwrap_or("").trim();
            if !value.is_empty() && value.contains('.') {
                result.address = value.to_string();
                result.status = DiagStatus::Success;
                break;
            }
        }
    }
    result
}

/// Extract the first MAC and first IPv4 address from interface listing
/// output (ipconfig-style labels). First occurrence wins; later adapters are
/// ignored.
pub fn parse_interface_info(output: &str) -> InterfaceInfo {
    let mut info = InterfaceInfo::default();
    for line in output.lines() {
        let line = line.trim();
        if line.contains("Physical Address") && line.contains(':') && info.mac == "Not found" {
            let value = line.split(':').nth(1).unwrap_or("").trim();
            if !value.is_empty() { info.mac = value.to_string(); }
        }
        if line.contains("IPv4 Address") && line.contains(':') && info.ipv4 == "Not found" {
            let value = line.rsplit(':').next().unwrap_or("").replace("(Preferred)", "");
            let value = value.trim();
            if !value.is_empty() { info.ipv4 = value.to_string(); }
        }
    }
    info
}

/// Collect device entries from ARP table output. A line qualifies with at
/// least three whitespace tokens, an IP-shaped first token and a MAC-shaped
/// second token; the broadcast MAC is dropped. No deduplication.
pub fn parse_arp_table(output: &str) -> Vec<ArpEntry> {
    let mut devices = Vec::new();
    for line in output.lines() {
        let parts: Vec<&str> = line.split_whitespace().collect();
        if parts.len() < 3 { continue; }
        let (ip, mac) = (parts[0], parts[1]);
        if ip.contains('.')
            && (mac.contains('-') || mac.contains(':'))
            && !mac.eq_ignore_ascii_case("ff-ff-ff-ff-ff-ff")
        {
            devices.push(ArpEntry { ip: ip.to_string(), mac: mac.to_string() });
        }
    }
    devices
}

#[cfg(test)]
mod tests {
    use super::*;

    const PING_OK: &str = "\nPinging example.com [93.184.216.34] with 32 bytes of data:\nReply from 93.184.216.34: bytes=32 time=12ms TTL=56\nReply from 93.184.216.34: bytes=32 time=14ms TTL=56\nReply from 93.184.216.34: bytes=32 time=13ms TTL=56\n\nPing statistics for 93.184.216.34:\n    Packets: Sent = 3, Received = 3, Lost = 0 (0% loss),\nApproximate round trip times in milli-seconds:\n    Minimum = 12ms, Maximum = 14ms, Average = 13ms\n";

    #[test]
    fn ping_extracts_counts_and_latency() {
        let stats = parse_ping(PING_OK);
        assert_eq!(stats.transmitted, 3);
        assert_eq!(stats.received, 3);
        assert_eq!(stats.loss, "0%");
        assert_eq!(stats.avg_ms, "13");
        assert_eq!(stats.status, DiagStatus::Success);
    }

    #[test]
    fn ping_all_lost_is_failed() {
        let out = "Ping statistics for 10.0.0.9:\n    Packets: Sent = 3, Received = 0, Lost = 3 (100% loss),\n";
        let stats = parse_ping(out);
        assert_eq!(stats.transmitted, 3);
        assert_eq!(stats.received, 0);
        assert_eq!(stats.loss, "100%");
        assert_eq!(stats.avg_ms, "N/A");
        assert_eq!(stats.status, DiagStatus::Failed);
    }

    #[test]
    fn ping_empty_output_keeps_sentinels() {
        let stats = parse_ping("");
        assert_eq!(stats.transmitted, 0);
        assert_eq!(stats.received, 0);
        assert_eq!(stats.loss, "100%");
        assert_eq!(stats.avg_ms, "N/A");
        assert_eq!(stats.status, DiagStatus::Failed);
    }

    #[test]
    fn ping_average_strips_unit_and_whitespace() {
        let out = "Sent = 1, Received = 1, Lost = 0 (0% loss)\n    Minimum = 1ms, Maximum = 2ms, Average =   2ms  \n";
        let stats = parse_ping(out);
        assert_eq!(stats.avg_ms, "2");
    }

    #[test]
    fn ping_last_statistics_line_wins() {
        let out = "Packets: Sent = 3, Received = 1, Lost = 2 (66% loss),\nPackets: Sent = 4, Received = 4, Lost = 0 (0% loss),\n";
        let stats = parse_ping(out);
        assert_eq!(stats.transmitted, 4);
        assert_eq!(stats.received, 4);
        assert_eq!(stats.loss, "0%");
    }

    #[test]
    fn ping_garbage_counts_leave_defaults() {
        let out = "Packets: Sent = x, Received = y, Lost = 0 (0% loss),\n";
        let stats = parse_ping(out);
        assert_eq!(stats.transmitted, 0);
        assert_eq!(stats.received, 0);
        assert_eq!(stats.loss, "0%");
    }

    const NSLOOKUP_OK: &str = "Server:  dns.local\nAddress:  192.168.1.1\n\nNon-authoritative answer:\nName:    example.com\nAddress:  93.184.216.34\n";

    #[test]
    fn lookup_takes_answer_after_marker() {
        let r = parse_lookup(NSLOOKUP_OK);
        assert_eq!(r.address, "93.184.216.34");
        assert_eq!(r.status, DiagStatus::Success);
    }

    #[test]
    fn lookup_without_marker_ignores_address_lines() {
        let out = "Server:  dns.local\nAddress:  192.168.1.1\n";
        let r = parse_lookup(out);
        assert_eq!(r.address, "Not found");
        assert_eq!(r.status, DiagStatus::Failed);
    }

    #[test]
    fn lookup_first_qualifying_address_wins() {
        let out = "Non-authoritative answer:\nAddress:  1.2.3.4\nAddress:  5.6.7.8\n";
        let r = parse_lookup(out);
        assert_eq!(r.address, "1.2.3.4");
    }

    #[test]
    fn lookup_skips_undotted_values() {
        let out = "Non-authoritative answer:\nAddress:  ::1\nAddress:  9.9.9.9\n";
        let r = parse_lookup(out);
        assert_eq!(r.address, "9.9.9.9");
    }

    const IPCONFIG_OUT: &str = "Ethernet adapter Ethernet:\n\n   Physical Address. . . . . . . . . : AA-BB-CC-DD-EE-01\n   IPv4 Address. . . . . . . . . . . : 192.168.1.50(Preferred)\n\nWireless LAN adapter Wi-Fi:\n\n   Physical Address. . . . . . . . . : AA-BB-CC-DD-EE-02\n   IPv4 Address. . . . . . . . . . . : 192.168.1.51(Preferred)\n";

    #[test]
    fn interface_first_adapter_wins() {
        let info = parse_interface_info(IPCONFIG_OUT);
        assert_eq!(info.mac, "AA-BB-CC-DD-EE-01");
        assert_eq!(info.ipv4, "192.168.1.50");
    }

    #[test]
    fn interface_strips_preferred_annotation() {
        let out = "IPv4 Address. . . : 10.0.0.7(Preferred)\n";
        let info = parse_interface_info(out);
        assert_eq!(info.ipv4, "10.0.0.7");
        assert_eq!(info.mac, "Not found");
    }

    #[test]
    fn interface_empty_output_keeps_sentinels() {
        let info = parse_interface_info("no labels here");
        assert_eq!(info.mac, "Not found");
        assert_eq!(info.ipv4, "Not found");
    }

    const ARP_OUT: &str = "Interface: 192.168.1.50 --- 0x8\n  Internet Address      Physical Address      Type\n  192.168.1.1           aa-bb-cc-dd-ee-ff     dynamic\n  192.168.1.5           11-22-33-44-55-66     dynamic\n  192.168.1.255         ff-ff-ff-ff-ff-ff     static\n  224.0.0.22            01-00-5e-00-00-16     static\n";

    #[test]
    fn arp_collects_entries_in_order() {
        let devices = parse_arp_table(ARP_OUT);
        let ips: Vec<&str> = devices.iter().map(|d| d.ip.as_str()).collect();
        assert_eq!(ips, vec!["192.168.1.1", "192.168.1.5", "224.0.0.22"]);
        assert_eq!(devices[0].mac, "aa-bb-cc-dd-ee-ff");
    }

    #[test]
    fn arp_excludes_broadcast_any_case() {
        let out = "  192.168.1.255  FF-FF-FF-FF-FF-FF  static\n  192.168.1.9  aa-bb-cc-dd-ee-00  dynamic\n";
        let devices = parse_arp_table(out);
        assert_eq!(devices, vec![ArpEntry { ip: "192.168.1.9".into(), mac: "aa-bb-cc-dd-ee-00".into() }]);
    }

    #[test]
    fn arp_requires_three_tokens_and_shapes() {
        let out = "192.168.1.7 aa-bb-cc-dd-ee-11\nheader line only\nnot-an-ip aa:bb:cc:dd:ee:ff dynamic\n";
        assert!(parse_arp_table(out).is_empty());
    }

    #[test]
    fn arp_accepts_colon_macs_and_keeps_duplicates() {
        let out = "10.0.0.2 aa:bb:cc:dd:ee:ff ether\n10.0.0.2 aa:bb:cc:dd:ee:ff ether\n";
        assert_eq!(parse_arp_table(out).len(), 2);
    }
}
