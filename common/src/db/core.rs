use crate::db::indices::*;
use crate::geom::gcell::GCell;
use std::collections::HashMap;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PinRole {
    Driver,
    User,
}

#[derive(Clone, Debug)]
pub struct NetData {
    pub name: String,
    pub pins: Vec<PinId>,
}

/// The pin-level view of a design: nets, and for each net the driver
/// and user pins with their grid-cell locations. A pin may map to
/// more than one cell.
pub struct NetDB {
    pub nets: Vec<NetData>,

    pub pin_roles: Vec<PinRole>,
    pub pin_cells: Vec<Vec<GCell>>,
    pub pin_to_net: Vec<NetId>,

    pub net_name_map: HashMap<String, NetId>,
}

impl NetDB {
    pub fn new() -> Self {
        Self {
            nets: Vec::with_capacity(1000),
            pin_roles: Vec::with_capacity(5000),
            pin_cells: Vec::with_capacity(5000),
            pin_to_net: Vec::with_capacity(5000),
            net_name_map: HashMap::new(),
        }
    }

    pub fn num_nets(&self) -> usize {
        self.nets.len()
    }
    pub fn num_pins(&self) -> usize {
        self.pin_roles.len()
    }

    pub fn add_net(&mut self, name: String) -> NetId {
        if let Some(&id) = self.net_name_map.get(&name) {
            return id;
        }
        let id = NetId::new(self.nets.len());
        self.nets.push(NetData {
            name: name.clone(),
            pins: Vec::new(),
        });
        self.net_name_map.insert(name, id);
        id
    }

    pub fn add_pin(&mut self, net: NetId, role: PinRole, cells: Vec<GCell>) -> PinId {
        let pid = PinId::new(self.pin_roles.len());
        self.pin_roles.push(role);
        self.pin_cells.push(cells);
        self.pin_to_net.push(net);
        self.nets[net.index()].pins.push(pid);
        pid
    }

    /// First driver pin of the net, if any.
    pub fn driver(&self, net: NetId) -> Option<PinId> {
        self.nets[net.index()]
            .pins
            .iter()
            .copied()
            .find(|&p| self.pin_roles[p.index()] == PinRole::Driver)
    }

    pub fn users(&self, net: NetId) -> impl Iterator<Item = PinId> + '_ {
        self.nets[net.index()]
            .pins
            .iter()
            .copied()
            .filter(|&p| self.pin_roles[p.index()] == PinRole::User)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_add_and_lookup() {
        let mut db = NetDB::new();
        let net = db.add_net("clk".to_string());
        assert_eq!(db.add_net("clk".to_string()), net);
        let drv = db.add_pin(net, PinRole::Driver, vec![GCell::new(1, 2)]);
        db.add_pin(net, PinRole::User, vec![GCell::new(3, 4), GCell::new(3, 5)]);
        assert_eq!(db.num_nets(), 1);
        assert_eq!(db.num_pins(), 2);
        assert_eq!(db.driver(net), Some(drv));
        assert_eq!(db.users(net).count(), 1);
        assert_eq!(db.pin_cells[drv.index()], vec![GCell::new(1, 2)]);
    }

    #[test]
    fn test_driverless_net() {
        let mut db = NetDB::new();
        let net = db.add_net("float".to_string());
        db.add_pin(net, PinRole::User, vec![GCell::new(0, 0)]);
        assert_eq!(db.driver(net), None);
    }
}
