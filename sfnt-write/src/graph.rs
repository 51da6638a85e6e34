//! A graph for resolving table offsets
//!
//! Compiling a table produces a set of objects (one per distinct subtable)
//! linked by offsets. Packing finds an order for those objects such that
//! every offset can be represented at its width; when a simple topological
//! sort is not enough, the graph is edited (by promoting lookups to
//! extension lookups and by duplicating shared subgraphs) and sorted again.
//!
//! The approach follows the HarfBuzz repacker; see the [repacker docs].
//!
//! [repacker docs]: https://github.com/harfbuzz/harfbuzz/blob/main/docs/repacker.md

use std::{
    collections::{BTreeMap, BTreeSet, BinaryHeap, HashMap, HashSet, VecDeque},
    sync::atomic::AtomicU64,
};

use types::OffsetLen;

use crate::{
    table_type::{LookupType, TableType},
    write::TableData,
};

static OBJECT_COUNTER: AtomicU64 = AtomicU64::new(0);

/// An identifier for an object in the compilation graph.
#[derive(Debug, Clone, Copy, PartialOrd, Ord, Hash, PartialEq, Eq)]
pub struct ObjectId(u64);

impl ObjectId {
    pub fn next() -> Self {
        ObjectId(OBJECT_COUNTER.fetch_add(1, std::sync::atomic::Ordering::Relaxed))
    }
}

/// A ranking used for sorting the graph.
///
/// Nodes are assigned a space, and nodes in lower spaces are always
/// packed before nodes in higher spaces.
#[derive(Debug, Clone, Copy, PartialOrd, Ord, Hash, PartialEq, Eq)]
struct Space(u32);

impl Space {
    /// Nodes reachable from the root via 16-bit offsets only.
    const SHORT_REACHABLE: Space = Space(0);
    /// Nodes that are reachable via any offset.
    const REACHABLE: Space = Space(1);
    /// The first space used for an isolated subgraph.
    const INIT: Space = Space(2);

    const fn is_custom(self) -> bool {
        self.0 >= Space::INIT.0
    }
}

/// Finished objects, deduplicated by content.
#[derive(Debug, Default)]
pub(crate) struct ObjectStore {
    objects: HashMap<TableData, ObjectId>,
}

impl ObjectStore {
    pub(crate) fn add(&mut self, data: TableData) -> ObjectId {
        *self.objects.entry(data).or_insert_with(ObjectId::next)
    }
}

/// A graph of subtables, starting at a single root.
///
/// This type is used during compilation, to determine the final write order
/// for the various subtables.
//NOTE: we don't derive Debug because it's way too verbose to be useful
pub struct Graph {
    /// the actual data for each table
    objects: BTreeMap<ObjectId, TableData>,
    /// graph-specific state used for sorting
    nodes: BTreeMap<ObjectId, Node>,
    order: Vec<ObjectId>,
    root: ObjectId,
    parents_invalid: bool,
    next_space: Space,
}

#[derive(Debug)]
struct Node {
    size: u32,
    distance: u32,
    /// overall position after sorting
    position: u32,
    space: Space,
    parents: Vec<(ObjectId, OffsetLen)>,
}

/// Score used when computing shortest distance
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
struct Distance {
    // like spaces are packed together, and larger spaces are packed after
    // smaller ones.
    space: Space,
    distance: u32,
    // a tie-breaker, based on the order in which links were seen
    order: u32,
}

/// A record of an overflowing offset
#[derive(Clone, Debug)]
pub(crate) struct Overflow {
    parent: ObjectId,
    child: ObjectId,
    distance: i64,
    offset_type: OffsetLen,
}

impl Distance {
    const ROOT: Distance = Distance {
        space: Space::SHORT_REACHABLE,
        distance: 0,
        order: 0,
    };
}

impl Node {
    fn new(size: u32) -> Self {
        Node {
            size,
            distance: 0,
            position: 0,
            space: Space::REACHABLE,
            parents: Vec::new(),
        }
    }
}

impl Graph {
    pub(crate) fn from_obj_store(store: ObjectStore, root: ObjectId) -> Self {
        let objects = store.objects.into_iter().map(|(k, v)| (v, k)).collect();
        Self::from_objects(objects, root)
    }

    fn from_objects(objects: BTreeMap<ObjectId, TableData>, root: ObjectId) -> Self {
        let nodes = objects
            .iter()
            .map(|(key, obj)| (*key, Node::new(obj.bytes.len() as u32)))
            .collect();
        Graph {
            objects,
            nodes,
            order: Vec::new(),
            root,
            parents_invalid: true,
            next_space: Space::INIT,
        }
    }

    /// Write out the serialized graph.
    ///
    /// The graph must have been packed successfully (see [`Graph::pack_objects`]).
    pub(crate) fn serialize(&self) -> Vec<u8> {
        let mut positions = HashMap::with_capacity(self.order.len());
        let mut out = Vec::new();

        // first pass: write out bytes, record the position of each object
        for id in &self.order {
            positions.insert(*id, out.len());
            if let Some(obj) = self.objects.get(id) {
                out.extend_from_slice(&obj.bytes);
            }
        }

        // second pass: write offsets
        for id in &self.order {
            let (Some(obj), Some(table_head)) = (self.objects.get(id), positions.get(id)) else {
                continue;
            };
            for link in &obj.offsets {
                let Some(target) = positions.get(&link.object) else {
                    log::warn!("offset to unpacked object {:?}", link.object);
                    continue;
                };
                let rel_off = (target - table_head) as u32;
                let pos = table_head + link.pos as usize;
                match link.len {
                    OffsetLen::Offset16 => {
                        out[pos..pos + 2].copy_from_slice(&(rel_off as u16).to_be_bytes())
                    }
                    OffsetLen::Offset32 => out[pos..pos + 4].copy_from_slice(&rel_off.to_be_bytes()),
                }
            }
        }
        out
    }

    /// Attempt to pack the graph.
    ///
    /// This involves finding an order for objects such that all offsets are
    /// resolveable.
    ///
    /// In the simple case, this just means finding a topological ordering.
    /// Otherwise, lookups are promoted to extension lookups where possible,
    /// subgraphs reachable by 32-bit offsets are isolated in their own
    /// spaces, and the graph is sorted by shortest distance.
    ///
    /// returns `true` if a solution is found, `false` otherwise
    pub(crate) fn pack_objects(&mut self) -> bool {
        if self.basic_sort() {
            return true;
        }

        self.try_promoting_subtables();

        log::debug!("assigning spaces");
        self.assign_spaces();
        self.sort_shortest_distance();

        let overflows = self.find_overflows();
        if overflows.is_empty() {
            return true;
        }
        self.debug_overflows(&overflows);
        false
    }

    /// Initial sorting operation. Attempt Kahn, falling back to shortest distance.
    ///
    /// returns `true` if sort succeeds with no overflows
    fn basic_sort(&mut self) -> bool {
        log::trace!("sorting {} objects", self.objects.len());

        self.sort_kahn();
        if !self.has_overflows() {
            return true;
        }
        log::trace!("kahn failed, trying shortest distance");
        self.sort_shortest_distance();
        !self.has_overflows()
    }

    // the distance from parent to child, if the offset cannot represent it
    fn overflow_distance(&self, parent: ObjectId, child: ObjectId, len: OffsetLen) -> Option<i64> {
        let parent = self.nodes.get(&parent)?;
        let child = self.nodes.get(&child)?;
        let distance = child.position as i64 - parent.position as i64;
        (distance < 0 || distance > len.max_value() as i64).then_some(distance)
    }

    fn has_overflows(&self) -> bool {
        self.objects.iter().any(|(parent, data)| {
            data.offsets
                .iter()
                .any(|link| self.overflow_distance(*parent, link.object, link.len).is_some())
        })
    }

    pub(crate) fn find_overflows(&self) -> Vec<Overflow> {
        let mut result = Vec::new();
        for (parent, data) in &self.objects {
            for link in &data.offsets {
                if let Some(distance) = self.overflow_distance(*parent, link.object, link.len) {
                    result.push(Overflow {
                        parent: *parent,
                        child: link.object,
                        distance,
                        offset_type: link.len,
                    });
                }
            }
        }
        result
    }

    fn debug_overflows(&self, overflows: &[Overflow]) {
        let (parents, children): (HashSet<_>, HashSet<_>) =
            overflows.iter().map(|x| (x.parent, x.child)).unzip();
        log::debug!(
            "found {} overflows from {} parents to {} children",
            overflows.len(),
            parents.len(),
            children.len()
        );

        for overflow in overflows {
            log::debug!(
                "{:?} -> {:?} type {} dist {}",
                overflow.parent,
                overflow.child,
                overflow.offset_type,
                overflow.distance
            );
        }
    }

    fn update_parents(&mut self) {
        if !self.parents_invalid {
            return;
        }
        for node in self.nodes.values_mut() {
            node.parents.clear();
        }

        for (id, obj) in &self.objects {
            for link in &obj.offsets {
                if let Some(child) = self.nodes.get_mut(&link.object) {
                    child.parents.push((*id, link.len));
                }
            }
        }
        self.parents_invalid = false;
    }

    fn sort_kahn(&mut self) {
        self.update_parents();
        let mut queue = BinaryHeap::new();
        queue.push(std::cmp::Reverse(self.root));
        self.sort_impl(queue, |_, _, child| std::cmp::Reverse(child));
    }

    fn sort_shortest_distance(&mut self) {
        self.update_parents();
        self.update_distances();
        self.assign_space_0();

        let mut queue = BinaryHeap::new();
        queue.push((std::cmp::Reverse(Distance::ROOT), self.root));
        let mut link_order = 0u32;
        self.sort_impl(queue, move |graph, _, child| {
            link_order += 1;
            let node = &graph.nodes[&child];
            let distance = Distance {
                space: node.space,
                distance: node.distance,
                order: link_order,
            };
            (std::cmp::Reverse(distance), child)
        });
    }

    /// Emit objects in heap order, pushing each child once all of its
    /// incoming links have been seen.
    fn sort_impl<K: Ord + HasId>(
        &mut self,
        mut queue: BinaryHeap<K>,
        mut key_for_child: impl FnMut(&Graph, ObjectId, ObjectId) -> K,
    ) {
        let mut removed_edges = HashMap::with_capacity(self.nodes.len());
        let mut order = Vec::with_capacity(self.nodes.len());
        let mut current_pos = 0u32;

        while let Some(id) = queue.pop().map(|key| key.id()) {
            order.push(id);
            if let Some(node) = self.nodes.get_mut(&id) {
                node.position = current_pos;
                current_pos = current_pos.saturating_add(node.size);
            }
            let Some(obj) = self.objects.get(&id) else {
                continue;
            };
            for link in &obj.offsets {
                let seen_edges = removed_edges.entry(link.object).or_insert(0usize);
                *seen_edges += 1;
                // if the target of this link has no other incoming links, add
                // to the queue
                if *seen_edges == self.nodes[&link.object].parents.len() {
                    queue.push(key_for_child(self, id, link.object));
                }
            }
        }

        if order.len() != self.nodes.len() {
            log::warn!(
                "sorted {} of {} objects; graph contains a cycle",
                order.len(),
                self.nodes.len()
            );
        }
        self.order = order;
    }

    fn update_distances(&mut self) {
        self.nodes
            .values_mut()
            .for_each(|node| node.distance = u32::MAX);
        if let Some(root) = self.nodes.get_mut(&self.root) {
            root.distance = 0;
        }

        let mut queue = BinaryHeap::new();
        let mut visited = HashSet::new();
        queue.push(std::cmp::Reverse((0u32, self.root)));

        while let Some(std::cmp::Reverse((_, next_id))) = queue.pop() {
            if !visited.insert(next_id) {
                continue;
            }
            let next_distance = self.nodes[&next_id].distance;
            for link in &self.objects[&next_id].offsets {
                if visited.contains(&link.object) {
                    continue;
                }
                let Some(child) = self.nodes.get_mut(&link.object) else {
                    continue;
                };
                let child_distance = next_distance.saturating_add(child.size);
                if child_distance < child.distance {
                    child.distance = child_distance;
                    queue.push(std::cmp::Reverse((child_distance, link.object)));
                }
            }
        }
    }

    /// Find the set of nodes that are reachable from root only following
    /// 16-bit offsets, and assign them to space 0.
    fn assign_space_0(&mut self) {
        let mut queue = VecDeque::from([self.root]);

        while let Some(next) = queue.pop_front() {
            match self.nodes.get_mut(&next) {
                Some(node) if node.space != Space::SHORT_REACHABLE => {
                    node.space = Space::SHORT_REACHABLE
                }
                _ => continue,
            }
            for link in self.objects.get(&next).into_iter().flat_map(|obj| &obj.offsets) {
                if link.len != OffsetLen::Offset32 {
                    queue.push_back(link.object);
                }
            }
        }
    }

    /// Isolate each subgraph reachable via 32-bit offsets in its own space.
    ///
    /// Nodes of a subgraph that are also reachable from outside of it are
    /// duplicated, so that after this every node in a custom space is only
    /// reachable through that space's root.
    ///
    /// Returns `true` if any space was assigned.
    fn assign_spaces(&mut self) -> bool {
        self.update_parents();
        let roots = self.find_space_roots();
        if roots.is_empty() {
            return false;
        }
        log::trace!("found {} space roots to isolate", roots.len());
        for root in roots {
            self.isolate_subgraph(root);
        }
        true
    }

    /// The targets of 32-bit offsets that are not themselves below another
    /// 32-bit offset.
    fn find_space_roots(&self) -> BTreeSet<ObjectId> {
        let mut visited = HashSet::new();
        let mut roots = BTreeSet::new();
        let mut queue = VecDeque::from([self.root]);

        while let Some(id) = queue.pop_front() {
            if !visited.insert(id) {
                continue;
            }
            for link in &self.objects[&id].offsets {
                if link.len == OffsetLen::Offset32 {
                    roots.insert(link.object);
                } else {
                    queue.push_back(link.object);
                }
            }
        }
        roots
    }

    fn isolate_subgraph(&mut self, root: ObjectId) {
        self.update_parents();

        // object id -> number of incoming edges from within the subgraph
        let mut subgraph = BTreeMap::new();
        let wide_parents = self.nodes[&root]
            .parents
            .iter()
            .filter(|(_, len)| *len == OffsetLen::Offset32)
            .count();
        subgraph.insert(root, wide_parents);
        self.count_subgraph_edges(root, &mut subgraph);

        let space = self.next_space();
        log::debug!("moving subgraph at {root:?} to {space:?}");

        let mut id_map = HashMap::new();
        for (id, edges_in_subgraph) in &subgraph {
            // reachable from outside the subgraph; dupe it
            if *edges_in_subgraph < self.nodes[id].parents.len() {
                self.duplicate_subgraph(*id, &mut id_map, space);
            }
        }

        // remap links from nodes that were not duplicated to their dupes
        for id in subgraph.keys().filter(|id| !id_map.contains_key(*id)) {
            if let Some(node) = self.nodes.get_mut(id) {
                node.space = space;
            }
            if let Some(obj) = self.objects.get_mut(id) {
                for link in &mut obj.offsets {
                    if let Some(new_id) = id_map.get(&link.object) {
                        link.object = *new_id;
                    }
                }
            }
        }

        // if the root itself was duplicated, its wide parents point at the dupe
        if let Some(new_root) = id_map.get(&root) {
            let wide_parents = self.nodes[&root]
                .parents
                .iter()
                .filter(|(_, len)| *len == OffsetLen::Offset32)
                .map(|(id, _)| *id)
                .collect::<Vec<_>>();
            for parent in wide_parents {
                if let Some(obj) = self.objects.get_mut(&parent) {
                    for link in obj.offsets.iter_mut().filter(|link| {
                        link.object == root && link.len == OffsetLen::Offset32
                    }) {
                        link.object = *new_root;
                    }
                }
            }
        }
        self.parents_invalid = true;
    }

    fn count_subgraph_edges(&self, id: ObjectId, subgraph: &mut BTreeMap<ObjectId, usize>) {
        use std::collections::btree_map::Entry;
        for link in &self.objects[&id].offsets {
            match subgraph.entry(link.object) {
                // only recurse the first time we see a node
                Entry::Vacant(entry) => {
                    entry.insert(1);
                    self.count_subgraph_edges(link.object, subgraph);
                }
                Entry::Occupied(entry) => *entry.into_mut() += 1,
            }
        }
    }

    fn duplicate_subgraph(
        &mut self,
        root: ObjectId,
        dupes: &mut HashMap<ObjectId, ObjectId>,
        space: Space,
    ) -> ObjectId {
        if let Some(existing) = dupes.get(&root) {
            return *existing;
        }
        self.parents_invalid = true;
        let new_root = ObjectId::next();
        log::trace!("duplicating node {root:?} to {new_root:?}");
        // register before recursing, so shared descendants are duped once
        dupes.insert(root, new_root);

        let mut obj = self.objects[&root].clone();
        for link in &mut obj.offsets {
            link.object = self.duplicate_subgraph(link.object, dupes, space);
        }
        let mut node = Node::new(obj.bytes.len() as u32);
        node.space = space;
        self.objects.insert(new_root, obj);
        self.nodes.insert(new_root, node);
        new_root
    }

    fn next_space(&mut self) -> Space {
        let space = self.next_space;
        self.next_space = Space(space.0 + 1);
        space
    }

    fn try_promoting_subtables(&mut self) {
        let Some((can_promote, parent_id)) = self.get_promotable_subtables() else {
            return;
        };
        let to_promote = self.select_promotions(&can_promote, parent_id);
        log::debug!(
            "promoting {} of {} eligible lookups to extension lookups",
            to_promote.len(),
            can_promote.len()
        );
        self.promote_subtables(&to_promote);
    }

    fn promote_subtables(&mut self, to_promote: &[ObjectId]) {
        fn make_extension(type_: LookupType, subtable_id: ObjectId) -> TableData {
            const EXT_FORMAT: u16 = 1;
            let mut data = TableData::new(TableType::Unknown);
            data.write(EXT_FORMAT);
            data.write(type_.to_raw());
            data.add_offset(subtable_id, 4);
            data
        }

        for id in to_promote {
            let Some(mut lookup) = self.objects.remove(id) else {
                continue;
            };
            let Some(lookup_type) = lookup.type_.to_lookup_type() else {
                self.objects.insert(*id, lookup);
                continue;
            };
            for subtable_ref in &mut lookup.offsets {
                let ext_table = make_extension(lookup_type, subtable_ref.object);
                subtable_ref.object = self.add_object(ext_table);
                subtable_ref.len = OffsetLen::Offset16;
            }
            // the lookup type is the first field of a lookup table
            let promoted = lookup_type.promote();
            lookup.write_over(promoted.to_raw(), 0);
            lookup.type_ = promoted.into();
            self.objects.insert(*id, lookup);
        }
        self.parents_invalid = true;
    }

    /// Manually add an object to the graph, after initial compilation.
    ///
    /// Objects added this way are not deduplicated.
    fn add_object(&mut self, data: TableData) -> ObjectId {
        self.parents_invalid = true;
        let id = ObjectId::next();
        self.nodes.insert(id, Node::new(data.bytes.len() as u32));
        self.objects.insert(id, data);
        id
    }

    // the lookups that can be promoted, as well as the id of their lookup list
    fn get_promotable_subtables(&self) -> Option<(Vec<ObjectId>, ObjectId)> {
        let can_promote = self
            .objects
            .iter()
            .filter_map(|(id, obj)| obj.type_.is_promotable().then_some(*id))
            .collect::<Vec<_>>();

        if can_promote.is_empty() {
            return None;
        }

        let parents = can_promote
            .iter()
            .flat_map(|id| self.nodes[id].parents.iter().map(|x| x.0))
            .collect::<HashSet<_>>();

        // every promotable lookup should belong to a single LookupList
        match parents.into_iter().collect::<Vec<_>>().as_slice() {
            [parent] => Some((can_promote, *parent)),
            _ => {
                log::warn!("promotable lookups do not share a single parent");
                None
            }
        }
    }

    /// Select the lookups to promote to extension lookups.
    ///
    /// Lookups are visited densest-first; each stays a regular lookup as long
    /// as every 16-bit layer of the table still fits. Once any layer is full,
    /// all remaining lookups are promoted.
    fn select_promotions(&self, candidates: &[ObjectId], parent_id: ObjectId) -> Vec<ObjectId> {
        // number of bytes added by an extension subtable
        const EXTENSION_SIZE: usize = 8;
        const MAX_LAYER_SIZE: usize = u16::MAX as usize;

        struct LookupSize {
            id: ObjectId,
            subgraph_size: usize,
            subtable_count: usize,
        }

        let mut lookup_sizes = candidates
            .iter()
            .map(|id| LookupSize {
                id: *id,
                subgraph_size: self.find_subgraph_size(*id),
                subtable_count: self.objects[id].offsets.len(),
            })
            .collect::<Vec<_>>();

        // more subtables per byte first; compare as cross products to stay integral
        lookup_sizes.sort_by(|a, b| {
            (b.subtable_count * a.subgraph_size).cmp(&(a.subtable_count * b.subgraph_size))
        });

        let lookup_list_size = self.objects[&parent_id].bytes.len();
        // LookupList + lookups
        let mut l2_l3_size = lookup_list_size;
        // lookups + lookup subtables
        let mut l3_l4_size = 0;
        // subtables and anything below them
        let mut l4_plus_size = 0;

        // start by assuming every lookup is promoted
        for lookup in &lookup_sizes {
            let subtables_size = lookup.subtable_count * EXTENSION_SIZE;
            l3_l4_size += subtables_size;
            l4_plus_size += subtables_size;
        }

        let mut layers_full = false;
        let mut to_promote = Vec::new();
        for lookup in &lookup_sizes {
            if !layers_full {
                let lookup_size = self.objects[&lookup.id].bytes.len();
                let subtables_size = self.find_children_size(lookup.id);
                let remaining_size = lookup
                    .subgraph_size
                    .saturating_sub(lookup_size + subtables_size);
                l2_l3_size += lookup_size;
                l3_l4_size += lookup_size + subtables_size;
                l3_l4_size -= lookup.subtable_count * EXTENSION_SIZE;
                l4_plus_size += subtables_size + remaining_size;

                if l2_l3_size < MAX_LAYER_SIZE
                    && l3_l4_size < MAX_LAYER_SIZE
                    && l4_plus_size < MAX_LAYER_SIZE
                {
                    continue;
                }
                layers_full = true;
            }
            to_promote.push(lookup.id);
        }
        to_promote
    }

    /// the size only of children of this object, not the whole subgraph
    fn find_children_size(&self, id: ObjectId) -> usize {
        self.objects[&id]
            .offsets
            .iter()
            .map(|off| self.objects[&off.object].bytes.len())
            .sum()
    }

    fn find_subgraph_size(&self, root: ObjectId) -> usize {
        let mut size = 0;
        let mut visited = HashSet::new();
        let mut queue = VecDeque::from([root]);
        while let Some(next) = queue.pop_front() {
            if !visited.insert(next) {
                continue;
            }
            let obj = &self.objects[&next];
            size += obj.bytes.len();
            queue.extend(obj.offsets.iter().map(|link| link.object));
        }
        size
    }

    #[cfg(test)]
    fn find_descendents(&self, root: ObjectId) -> HashSet<ObjectId> {
        let mut result = HashSet::new();
        let mut queue = VecDeque::from([root]);
        while let Some(id) = queue.pop_front() {
            if result.insert(id) {
                queue.extend(self.objects[&id].offsets.iter().map(|link| link.object));
            }
        }
        result
    }
}

/// Heap entries used while sorting carry the id of the object they order.
trait HasId {
    fn id(&self) -> ObjectId;
}

impl HasId for std::cmp::Reverse<ObjectId> {
    fn id(&self) -> ObjectId {
        self.0
    }
}

impl HasId for (std::cmp::Reverse<Distance>, ObjectId) {
    fn id(&self) -> ObjectId {
        self.1
    }
}

impl std::fmt::Debug for Graph {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Graph")
            .field("objects", &self.objects.len())
            .field("root", &self.root)
            .finish()
    }
}
