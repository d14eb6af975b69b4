//! L4 ClientList — ordered tile list + focus stack.
//!
//! Realized per the arena-with-stable-ids shape spec.md's DESIGN NOTES call
//! for instead of the C doubly-linked list: `Vec<Client>` is the spatial
//! list (index order == `next`/`prev` chain) and `focus_stack` is the MRU
//! order (`snext` chain), both indexed by `ClientId` rather than raw
//! pointers. Grounded on the teacher's flat `Vec<Window>` + `active_idx`
//! shape in `types.rs::AppState`, generalized to carry a real focus stack
//! (the teacher only tracks one active index, no MRU).

use crate::client::{Client, ClientId};

pub struct ClientList {
    pub clients: Vec<Client>,
    /// Most-recently-focused order, head first. `sel` is `focus_stack[0]`
    /// among currently visible clients.
    focus_stack: Vec<ClientId>,
    pub lastsel: Option<ClientId>,
    pub current_tagset: u32,
    pub prev_tagset: u32,
}

impl ClientList {
    pub fn new(initial_tagset: u32) -> Self {
        ClientList {
            clients: Vec::new(),
            focus_stack: Vec::new(),
            lastsel: None,
            current_tagset: initial_tagset,
            prev_tagset: initial_tagset,
        }
    }

    pub fn is_visible(&self, c: &Client) -> bool {
        c.tags & self.current_tagset != 0
    }

    pub fn get(&self, id: ClientId) -> Option<&Client> {
        self.clients.iter().find(|c| c.id == id)
    }

    pub fn get_mut(&mut self, id: ClientId) -> Option<&mut Client> {
        self.clients.iter_mut().find(|c| c.id == id)
    }

    /// `attach(c)`: prepend to the spatial list.
    pub fn attach(&mut self, c: Client) {
        self.clients.insert(0, c);
        self.renumber();
    }

    /// `attach_after(c, a)`: insert right after client `a`.
    pub fn attach_after(&mut self, c: Client, after: ClientId) {
        if let Some(pos) = self.clients.iter().position(|x| x.id == after) {
            self.clients.insert(pos + 1, c);
        } else {
            self.clients.push(c);
        }
        self.renumber();
    }

    /// `detach(c)`: remove from the spatial list, keep the caller's owned
    /// `Client` (so it can be destroyed by the caller after process cleanup).
    pub fn detach(&mut self, id: ClientId) -> Option<Client> {
        let pos = self.clients.iter().position(|c| c.id == id)?;
        let removed = self.clients.remove(pos);
        self.detach_stack(id);
        self.renumber();
        Some(removed)
    }

    pub fn attach_stack(&mut self, id: ClientId) {
        self.focus_stack.retain(|&x| x != id);
        self.focus_stack.insert(0, id);
    }

    pub fn detach_stack(&mut self, id: ClientId) {
        self.focus_stack.retain(|&x| x != id);
    }

    /// `order` is dense, 1-based, over *visible* clients only — spec.md
    /// invariant 2. Minimized clients still receive an `order` (they
    /// occupy the minimized strip, not the main area).
    pub fn renumber(&mut self) {
        let tagset = self.current_tagset;
        let mut n = 1usize;
        for c in self.clients.iter_mut() {
            if c.tags & tagset != 0 {
                c.order = n;
                n += 1;
            }
        }
    }

    pub fn visible(&self) -> impl Iterator<Item = &Client> {
        let tagset = self.current_tagset;
        self.clients.iter().filter(move |c| c.tags & tagset != 0)
    }

    pub fn visible_ids(&self) -> Vec<ClientId> {
        self.visible().map(|c| c.id).collect()
    }

    /// `next_visible(c)`: first visible client strictly after `c` in the
    /// spatial list, skipping clients whose tag mask doesn't intersect.
    pub fn next_visible(&self, id: ClientId) -> Option<ClientId> {
        let pos = self.clients.iter().position(|c| c.id == id)?;
        self.clients[pos + 1..]
            .iter()
            .find(|c| self.is_visible(c))
            .map(|c| c.id)
    }

    pub fn prev_visible(&self, id: ClientId) -> Option<ClientId> {
        let pos = self.clients.iter().position(|c| c.id == id)?;
        self.clients[..pos].iter().rev().find(|c| self.is_visible(c)).map(|c| c.id)
    }

    /// Current selection: top of the focus stack among visible clients.
    pub fn sel(&self) -> Option<ClientId> {
        self.focus_stack.iter().copied().find(|id| {
            self.get(*id).map(|c| self.is_visible(c)).unwrap_or(false)
        })
    }

    /// `focus(c)` — `c = None` means "top visible on focus stack" per
    /// spec.md 4.1. Clears urgency on the previous selection and moves `c`
    /// to the top of the focus stack.
    pub fn focus(&mut self, c: Option<ClientId>) {
        let prev = self.sel();
        if let Some(id) = prev {
            if Some(id) != c {
                self.lastsel = Some(id);
            }
        }
        let target = match c {
            Some(id) => Some(id),
            None => self.focus_stack.iter().copied().find(|id| {
                self.get(*id).map(|c| self.is_visible(c)).unwrap_or(false)
            }),
        };
        if let Some(id) = target {
            if let Some(c) = self.get_mut(id) {
                c.urgent = false;
            }
            self.attach_stack(id);
        }
    }

    pub fn visible_count(&self) -> usize {
        self.visible().count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dummy(id: ClientId, tags: u32) -> Client {
        // Tests exercise list bookkeeping only, never real PTY I/O, so a
        // fully spawned Client isn't needed — see `Client::spawn` for the
        // real constructor used at runtime.
        crate::client::Client::test_stub(id, tags)
    }

    #[test]
    fn order_is_dense_and_1_based() {
        let mut l = ClientList::new(1);
        l.attach(dummy(1, 1));
        l.attach(dummy(2, 1));
        l.attach(dummy(3, 1));
        let orders: Vec<usize> = l.clients.iter().map(|c| c.order).collect();
        let mut sorted = orders.clone();
        sorted.sort();
        assert_eq!(sorted, vec![1, 2, 3]);
    }

    #[test]
    fn detach_renumbers_densely() {
        let mut l = ClientList::new(1);
        for i in 1..=5 {
            l.attach(dummy(i, 1));
        }
        l.detach(3);
        let mut orders: Vec<usize> = l.clients.iter().map(|c| c.order).collect();
        orders.sort();
        assert_eq!(orders, vec![1, 2, 3, 4]);
    }

    #[test]
    fn sel_is_none_when_nothing_visible() {
        let mut l = ClientList::new(1);
        l.attach(dummy(1, 2)); // different tag, not visible under tagset 1
        assert_eq!(l.sel(), None);
    }

    #[test]
    fn focus_updates_lastsel() {
        let mut l = ClientList::new(1);
        l.attach(dummy(1, 1));
        l.attach(dummy(2, 1));
        l.focus(Some(1));
        l.focus(Some(2));
        assert_eq!(l.lastsel, Some(1));
        assert_eq!(l.sel(), Some(2));
    }
}
