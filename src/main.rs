use anyhow::*;
use clap::{Arg, Command};
use log::*;
use std::io;
use std::os::unix::io::AsRawFd;

use l2cap_bridge::*;
use l2cap_bridge::config::{ConnectPolicy, LinkConfig};
use l2cap_bridge::link::{Address, AddressType, L2capLink, Link};

fn link_config() -> Result<LinkConfig> {
    let matches = Command::new("l2cap-bridge")
        .about("Bridges hex lines on stdin/stdout to the ATT channel of a Bluetooth LE peripheral")
        .arg(Arg::new("address")
            .help("Peripheral address, e.g. a4:c1:38:c0:03:9e")
            .required(true))
        .arg(Arg::new("address-type")
            .help("`random` for a random address, anything else for a public one")
            .default_value("public"))
        .arg(Arg::new("hci")
            .long("hci")
            .help("Index of the local HCI controller used for RSSI queries")
            .takes_value(true)
            .default_value("0"))
        .arg(Arg::new("keep-going")
            .long("keep-going")
            .help("Run the bridge even if connecting fails; the first read then ends it"))
        .get_matches();

    let address = matches.value_of("address").unwrap_or_default();
    let address: Address = address.parse()
        .with_context(|| format!("invalid 'address' argument: {}", address))?;
    let address_type = AddressType::from_arg(matches.value_of("address-type").unwrap_or_default());
    let hci = matches.value_of("hci").unwrap_or_default();

    let mut config = LinkConfig::new(address, address_type);
    config.hci_dev = hci.parse()
        .with_context(|| format!("invalid 'hci' argument: {}", hci))?;
    if matches.is_present("keep-going") {
        config.connect_policy = ConnectPolicy::KeepGoing;
    }
    Ok(config)
}

pub fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default()
        .default_filter_or("info")).init();

    let config = link_config()?;

    let latch = SignalLatch::new();
    latch.install()?;
    if let Err(e) = terminate_with_parent() {
        warn!("{}", e);
    }

    let mut link = L2capLink::new(&config)?;
    // A failed bind still lets connect pick a local address.
    let _ = link.bind();
    let connected = link.connect();

    let stdout = io::stdout();
    let mut report = bridge::Reporter::new(stdout.lock());
    report.connect(&connected);
    drop(report);

    if let Err(e) = connected {
        match config.connect_policy {
            ConnectPolicy::FailFast => {
                link.close();
                return Err(e).context(format!("couldn't connect to {}", config.address));
            }
            ConnectPolicy::KeepGoing => warn!("continuing without a connection: {}", e),
        }
    }

    let mux = PollMux::new(RawStdin.as_raw_fd(), link.as_raw_fd());
    let termination = Bridge::new(BridgeConfig::default(), link, mux, RawStdin, stdout.lock(),
        latch).run();
    debug!("exiting after {:?}", termination);

    Ok(())
}
