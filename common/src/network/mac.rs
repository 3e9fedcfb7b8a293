use std::net::IpAddr;

use pnet::util::MacAddr;

/// Derives a stable, locally administered MAC-like identifier from an address.
///
/// The first octet `0x02` marks the identifier as locally administered so it
/// never collides with a vendor OUI. The last four octets come from the
/// address, which keeps the identifier identical across repeated scans.
pub fn synthetic_mac(addr: IpAddr) -> MacAddr {
    let tail: [u8; 4] = match addr {
        IpAddr::V4(v4) => v4.octets(),
        IpAddr::V6(v6) => {
            let octets = v6.octets();
            [octets[12], octets[13], octets[14], octets[15]]
        }
    };
    MacAddr::new(0x02, 0x00, tail[0], tail[1], tail[2], tail[3])
}

// ╔════════════════════════════════════════════╗
// ║ ████████╗███████╗███████╗████████╗███████╗ ║
// ║ ╚══██╔══╝██╔════╝██╔════╝╚══██╔══╝██╔════╝ ║
// ║    ██║   █████╗  ███████╗   ██║   ███████╗ ║
// ║    ██║   ██╔══╝  ╚════██║   ██║   ╚════██║ ║
// ║    ██║   ███████╗███████║   ██║   ███████║ ║
// ║    ╚═╝   ╚══════╝╚══════╝   ╚═╝   ╚══════╝ ║
// ╚════════════════════════════════════════════╝
