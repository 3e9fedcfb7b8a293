use colored::*;
use lanscout_common::models::device::Category;
use lanscout_common::models::finding::FindingKind;
use lanscout_common::network::ports::WELL_KNOWN_SERVICES;
use unicode_width::UnicodeWidthStr;

use crate::mprint;
use crate::terminal::{colors, print};

pub fn catalog(q_level: u8) {
    print::header("finding catalog", q_level);
    let width = FindingKind::CATALOG
        .iter()
        .map(|kind| kind.name().width())
        .max()
        .unwrap_or(0);
    for kind in FindingKind::CATALOG {
        print::aligned_line(kind.name(), width, kind.description());
    }

    mprint!();
    print::header("device categories", q_level);
    let width = Category::ALL
        .iter()
        .map(|c| c.label().width())
        .max()
        .unwrap_or(0);
    for category in Category::ALL {
        let example = format!("{}-1", category.hostname_prefix()).color(colors::SECONDARY);
        print::aligned_line(category.label(), width, example);
    }

    mprint!();
    print::header("well-known ports", q_level);
    for service in WELL_KNOWN_SERVICES {
        let key = format!("{:>5} {}", service.port, service.service);
        print::aligned_line(&key, 18, service.description);
    }

    print::end_of_program();
}
