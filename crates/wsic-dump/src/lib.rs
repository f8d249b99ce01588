pub mod model;

// Re-export commonly used types/functions for consumers
pub use model::{header, load_object, parse_object, relocations, ObjectFile};

use wsic_rs::disasm::{disasm_text, fmt_record};
use wsic_rs::record::Record;

/// Human-readable record listing, one line per record.
pub fn record_listing(obj: &ObjectFile) -> Vec<String> {
    obj.records.iter().map(fmt_record).collect()
}

/// Disassembly of every text record. Words patched by a modification
/// record are marked with `*`.
pub fn disasm_listing(obj: &ObjectFile, show_bytes: bool) -> Vec<String> {
    let relocs = relocations(obj);
    let mut out = Vec::new();
    for r in &obj.records {
        let Record::Text { start, payload } = r else { continue };
        for line in disasm_text(*start, payload) {
            let mark = if relocs.contains(&(line.addr + 1)) { "*" } else { " " };
            if show_bytes {
                let hex: Vec<String> = line.bytes.iter().map(|b| format!("{b:02x}")).collect();
                out.push(format!("{:06X}: {:<9}{mark} {}", line.addr, hex.join(" "), line.text));
            } else {
                out.push(format!("{:06X}:{mark} {}", line.addr, line.text));
            }
        }
    }
    out
}
