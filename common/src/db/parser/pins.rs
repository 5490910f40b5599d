use crate::db::core::{NetDB, PinRole};
use crate::db::indices::NetId;
use crate::geom::gcell::GCell;
use anyhow::{anyhow, Result};
use std::fs::File;
use std::io::{BufRead, BufReader};

/// Parses a pin-list file into the database.
///
/// Format, one keyword per line, `#` starts a comment:
/// ```text
/// net <name>
///   driver <x> <y> [<x> <y> ...]
///   user   <x> <y> [<x> <y> ...]
/// ```
pub fn parse(db: &mut NetDB, filename: &str) -> Result<()> {
    let file = File::open(filename)?;
    parse_reader(db, BufReader::new(file))
}

pub fn parse_reader<R: BufRead>(db: &mut NetDB, reader: R) -> Result<()> {
    let mut current_net: Option<NetId> = None;

    for (i, line) in reader.lines().enumerate() {
        let line = line?;
        let lineno = i + 1;
        let text = line.split('#').next().unwrap_or("");
        let parts: Vec<&str> = text.split_whitespace().collect();
        if parts.is_empty() {
            continue;
        }

        match parts[0] {
            "net" => {
                if parts.len() != 2 {
                    return Err(anyhow!("line {}: expected 'net <name>'", lineno));
                }
                current_net = Some(db.add_net(parts[1].to_string()));
            }
            "driver" | "user" => {
                let net = current_net
                    .ok_or_else(|| anyhow!("line {}: pin outside of a net block", lineno))?;
                let cells = parse_cells(&parts[1..], lineno)?;
                let role = if parts[0] == "driver" {
                    PinRole::Driver
                } else {
                    PinRole::User
                };
                db.add_pin(net, role, cells);
            }
            other => {
                return Err(anyhow!("line {}: unknown keyword '{}'", lineno, other));
            }
        }
    }
    Ok(())
}

fn parse_cells(parts: &[&str], lineno: usize) -> Result<Vec<GCell>> {
    if parts.is_empty() || parts.len() % 2 != 0 {
        return Err(anyhow!(
            "line {}: expected one or more '<x> <y>' coordinate pairs",
            lineno
        ));
    }
    let mut cells = Vec::with_capacity(parts.len() / 2);
    for pair in parts.chunks(2) {
        let x: i16 = pair[0]
            .parse()
            .map_err(|_| anyhow!("line {}: invalid coordinate '{}'", lineno, pair[0]))?;
        let y: i16 = pair[1]
            .parse()
            .map_err(|_| anyhow!("line {}: invalid coordinate '{}'", lineno, pair[1]))?;
        cells.push(GCell::new(x, y));
    }
    Ok(cells)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn test_parse_basic() {
        let text = "\
# two nets
net clk
  driver 5 7
  user 12 9
  user 3 22 3 23
net rst
  driver 0 0
";
        let mut db = NetDB::new();
        parse_reader(&mut db, Cursor::new(text)).unwrap();
        assert_eq!(db.num_nets(), 2);
        assert_eq!(db.num_pins(), 4);
        let clk = db.net_name_map["clk"];
        let drv = db.driver(clk).unwrap();
        assert_eq!(db.pin_cells[drv.index()], vec![GCell::new(5, 7)]);
        let multi = db.users(clk).nth(1).unwrap();
        assert_eq!(db.pin_cells[multi.index()].len(), 2);
    }

    #[test]
    fn test_parse_errors() {
        let mut db = NetDB::new();
        assert!(parse_reader(&mut db, Cursor::new("user 1 2\n")).is_err());
        assert!(parse_reader(&mut db, Cursor::new("net a\ndriver 1\n")).is_err());
        assert!(parse_reader(&mut db, Cursor::new("net a\ndriver 1 b\n")).is_err());
        assert!(parse_reader(&mut db, Cursor::new("wires 1 2\n")).is_err());
    }
}
