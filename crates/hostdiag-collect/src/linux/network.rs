//! Network collector: `/proc/net/dev`, `/proc/net/snmp`, `ss`-derived
//! TIME_WAIT/CLOSE_WAIT counts, TCP sysctls and congestion control.

use std::collections::HashMap;
use std::path::Path;
use std::time::Duration;

use hostdiag_exec::{CancelToken, Ctx};
use hostdiag_model::{Availability, CollectConfig, CollectResult, Collector, NetInterface, NetworkData, Payload, Result, Tier};

use super::procfs::{delta_u64, parse_u64_or_zero, read_to_string_lossy};

const TCP_SYSCTLS: &[&str] = &["tcp_rmem", "tcp_wmem", "tcp_fin_timeout", "tcp_max_syn_backlog"];

#[derive(Default, Clone, Copy)]
struct IfaceRaw {
    rx_bytes: u64,
    rx_packets: u64,
    rx_errs: u64,
    rx_drop: u64,
    tx_bytes: u64,
    tx_packets: u64,
    tx_errs: u64,
    tx_drop: u64,
}

fn read_net_dev(proc_root: &Path) -> HashMap<String, IfaceRaw> {
    let content = read_to_string_lossy(&proc_root.join("net/dev"));
    let mut out = HashMap::new();
    for line in content.lines().skip(2) {
        let Some((name, rest)) = line.split_once(':') else { continue };
        let fields: Vec<&str> = rest.split_whitespace().collect();
        if fields.len() < 16 {
            continue;
        }
        out.insert(
            name.trim().to_string(),
            IfaceRaw {
                rx_bytes: parse_u64_or_zero(fields[0]),
                rx_packets: parse_u64_or_zero(fields[1]),
                rx_errs: parse_u64_or_zero(fields[2]),
                rx_drop: parse_u64_or_zero(fields[3]),
                tx_bytes: parse_u64_or_zero(fields[8]),
                tx_packets: parse_u64_or_zero(fields[9]),
                tx_errs: parse_u64_or_zero(fields[10]),
                tx_drop: parse_u64_or_zero(fields[11]),
            },
        );
    }
    out
}

struct TcpSnmp {
    retrans_segs: u64,
    in_errs: u64,
}

fn read_net_snmp_tcp(proc_root: &Path) -> TcpSnmp {
    let content = read_to_string_lossy(&proc_root.join("net/snmp"));
    let mut header: Option<Vec<&str>> = None;
    for line in content.lines() {
        if let Some(rest) = line.strip_prefix("Tcp:") {
            let fields: Vec<&str> = rest.split_whitespace().collect();
            match &header {
                None => header = Some(fields),
                Some(names) => {
                    let get = |key: &str| -> u64 {
                        names
                            .iter()
                            .position(|n| *n == key)
                            .and_then(|i| fields.get(i))
                            .map(|v| parse_u64_or_zero(v))
                            .unwrap_or(0)
                    };
                    return TcpSnmp { retrans_segs: get("RetransSegs"), in_errs: get("InErrs") };
                }
            }
        }
    }
    TcpSnmp { retrans_segs: 0, in_errs: 0 }
}

fn read_tcp_sysctls(proc_root: &Path) -> HashMap<String, String> {
    let mut out = HashMap::new();
    for name in TCP_SYSCTLS {
        let raw = read_to_string_lossy(&proc_root.join(format!("sys/net/ipv4/{name}"))).trim().to_string();
        out.insert((*name).to_string(), raw);
    }
    out
}

fn read_congestion_control(proc_root: &Path) -> String {
    read_to_string_lossy(&proc_root.join("sys/net/ipv4/tcp_congestion_control")).trim().to_string()
}

fn count_ss_lines(output: &str) -> u64 {
    // `ss -tn state close-wait` prints a header line followed by one
    // line per matching socket.
    output.lines().skip(1).filter(|l| !l.trim().is_empty()).count() as u64
}

fn extract_ss_summary_count(output: &str, label: &str) -> u64 {
    for line in output.lines() {
        if let Some(rest) = line.strip_prefix(label) {
            if let Some(value) = rest.split_whitespace().next() {
                return parse_u64_or_zero(value);
            }
        }
    }
    0
}

fn run_ss(args: &[&str]) -> String {
    let cancel = CancelToken::new();
    let owned: Vec<String> = args.iter().map(|a| a.to_string()).collect();
    hostdiag_exec::run("ss", &owned, Duration::from_secs(5), &cancel, false, None)
        .map(|out| out.stdout)
        .unwrap_or_default()
}

/// procfs+`ss`-backed network collector.
pub struct NetworkCollector;

impl Collector for NetworkCollector {
    fn name(&self) -> &str {
        "procfs-network"
    }

    fn category(&self) -> &str {
        "network"
    }

    fn available(&self, _cfg: &CollectConfig) -> Availability {
        Availability::ok(Tier::Procfs)
    }

    fn collect(&self, cfg: &CollectConfig) -> Result<CollectResult> {
        collect(cfg, &Ctx::with_timeout(cfg.duration))
    }
}

/// Two-point delta-sampled network collection.
pub fn collect(cfg: &CollectConfig, ctx: &Ctx) -> Result<CollectResult> {
    let before_ifaces = read_net_dev(&cfg.proc_root);
    let before_snmp = read_net_snmp_tcp(&cfg.proc_root);
    ctx.cancellable_sleep(cfg.effective_sample_interval());
    let after_ifaces = read_net_dev(&cfg.proc_root);
    let after_snmp = read_net_snmp_tcp(&cfg.proc_root);

    let interval_secs = cfg.effective_sample_interval().as_secs_f64().max(1e-9);

    let mut interfaces: Vec<NetInterface> = after_ifaces
        .iter()
        .map(|(name, a)| {
            let b = before_ifaces.get(name).copied().unwrap_or_default();
            let errors = delta_u64(b.rx_errs + b.tx_errs + b.rx_drop + b.tx_drop, a.rx_errs + a.tx_errs + a.rx_drop + a.tx_drop);
            NetInterface {
                name: name.clone(),
                rx_bytes: delta_u64(b.rx_bytes, a.rx_bytes),
                tx_bytes: delta_u64(b.tx_bytes, a.tx_bytes),
                rx_packets: delta_u64(b.rx_packets, a.rx_packets),
                tx_packets: delta_u64(b.tx_packets, a.tx_packets),
                errors_per_sec: errors as f64 / interval_secs,
            }
        })
        .collect();
    interfaces.sort_by(|a, b| a.name.cmp(&b.name));

    let retrans_rate = delta_u64(before_snmp.retrans_segs, after_snmp.retrans_segs) as f64 / interval_secs;

    let ss_summary = run_ss(&["-s"]);
    let close_wait_output = run_ss(&["-tn", "state", "close-wait"]);

    let data = NetworkData {
        interfaces,
        retrans_rate,
        time_wait: extract_ss_summary_count(&ss_summary, "TIME-WAIT"),
        close_wait: count_ss_lines(&close_wait_output),
        tcp_sysctls: read_tcp_sysctls(&cfg.proc_root),
        congestion_control: read_congestion_control(&cfg.proc_root),
        tcp_in_errs: after_snmp.in_errs,
    };

    Ok(CollectResult::new("procfs-network", "network", Tier::Procfs).with_payload(Payload::Network(data)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn net_dev_skips_two_header_rows() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join("net/dev"),
            "",
        )
        .unwrap_or(());
        std::fs::create_dir_all(dir.path().join("net")).unwrap();
        std::fs::write(
            dir.path().join("net/dev"),
            "Inter-|   Receive                                                |  Transmit\n \
             face |bytes    packets errs drop fifo frame compressed multicast|bytes    packets errs drop fifo colls carrier compressed\n\
             eth0: 100 1 0 0 0 0 0 0 200 2 0 0 0 0 0 0\n",
        )
        .unwrap();
        let ifaces = read_net_dev(dir.path());
        assert_eq!(ifaces.len(), 1);
        assert_eq!(ifaces["eth0"].rx_bytes, 100);
        assert_eq!(ifaces["eth0"].tx_bytes, 200);
    }

    #[test]
    fn errors_per_sec_uses_sum_of_four_error_counters() {
        let before = IfaceRaw { rx_errs: 1, tx_errs: 1, rx_drop: 1, tx_drop: 1, ..Default::default() };
        let after = IfaceRaw { rx_errs: 2, tx_errs: 2, rx_drop: 2, tx_drop: 2, ..Default::default() };
        let delta = delta_u64(before.rx_errs + before.tx_errs + before.rx_drop + before.tx_drop, after.rx_errs + after.tx_errs + after.rx_drop + after.tx_drop);
        assert_eq!(delta, 4);
    }

    #[test]
    fn retrans_snmp_line_requires_header_then_values() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir_all(dir.path().join("net")).unwrap();
        std::fs::write(
            dir.path().join("net/snmp"),
            "Tcp: RtoAlgorithm RtoMin RetransSegs InErrs\nTcp: 1 200 42 7\n",
        )
        .unwrap();
        let tcp = read_net_snmp_tcp(dir.path());
        assert_eq!(tcp.retrans_segs, 42);
        assert_eq!(tcp.in_errs, 7);
    }
}
