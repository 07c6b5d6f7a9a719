//! Dump every interface address via a real route socket and print each
//! decoded reply as JSON.
//!
//! Run with: cargo run --example dump_addrs

#[cfg(target_os = "linux")]
fn main() -> anyhow::Result<()> {
    use log::info;
    use netlink_client::consts;
    use netlink_client::socket::RouteSocket;
    use netlink_client::{AddressFields, DatagramEndpoint, Request, RequestSession, VariantHeader};

    env_logger::Builder::from_default_env()
        .filter_level(log::LevelFilter::Info)
        .init();

    let socket = RouteSocket::open()?;
    info!("route socket bound with pid {}", socket.local_pid());
    let mut session = RequestSession::new(socket);

    let request = Request::new(
        consts::RTM_GETADDR,
        VariantHeader::Address(AddressFields::default()),
    )
    .dump();

    let replies = session.request(request)?;
    info!("{} address entries", replies.len());
    for reply in &replies {
        println!("{}", serde_json::to_string(reply)?);
    }
    Ok(())
}

#[cfg(not(target_os = "linux"))]
fn main() {
    eprintln!("dump_addrs only runs on Linux");
}
