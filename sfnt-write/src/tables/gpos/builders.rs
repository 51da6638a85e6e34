//! GPOS lookup builders

use std::collections::{BTreeMap, BTreeSet};

use types::GlyphId16;

use super::{
    AnchorMatrix, AnchorTable, Class1Record, Class2Record, CursivePosFormat1, EntryExitRecord,
    LigatureArray, MarkArray,
    MarkBasePosFormat1, MarkLigPosFormat1, MarkMarkPosFormat1, MarkRecord, PairPos, PairSet,
    PairValueRecord, SinglePos, ValueRecord,
};
use crate::tables::layout::{
    builders::{Builder, ClassDefBuilder},
    CoverageTable,
};

/// A builder for [`SinglePos`] subtables.
#[derive(Clone, Debug, Default)]
pub struct SinglePosBuilder {
    items: BTreeMap<GlyphId16, ValueRecord>,
}

impl SinglePosBuilder {
    /// Add this adjustment to the builder.
    ///
    /// If there is an existing adjustment for this glyph, it will be
    /// overwritten.
    pub fn insert(&mut self, glyph: GlyphId16, record: ValueRecord) {
        self.items.insert(glyph, record);
    }

    /// Returns `true` if this adjustment can be added without replacing a
    /// different one.
    pub fn can_add(&self, glyph: GlyphId16, record: &ValueRecord) -> bool {
        !matches!(self.items.get(&glyph), Some(existing) if existing != record)
    }

    /// Returns `true` if there are no adjustments in this builder.
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Iterate all the adjustments in this builder.
    pub fn iter(&self) -> impl Iterator<Item = (GlyphId16, &ValueRecord)> + '_ {
        self.items.iter().map(|(gid, rec)| (*gid, rec))
    }
}

impl Builder for SinglePosBuilder {
    type Output = Vec<SinglePos>;

    fn build(self) -> Self::Output {
        let Some(first) = self.items.values().next() else {
            return Default::default();
        };
        let coverage: CoverageTable = self.items.keys().copied().collect();
        if self.items.values().all(|rec| rec == first) {
            let record = first.clone();
            vec![SinglePos::format_1(coverage, record)]
        } else {
            vec![SinglePos::format_2(
                coverage,
                self.items.into_values().collect(),
            )]
        }
    }
}

/// A builder for glyph [`PairPos`] subtables (format 1).
#[derive(Clone, Debug, Default)]
pub struct PairPosBuilder {
    items: BTreeMap<GlyphId16, BTreeMap<GlyphId16, (ValueRecord, ValueRecord)>>,
}

impl PairPosBuilder {
    /// Add the adjustments for a pair of glyphs.
    ///
    /// An existing entry for this pair is overwritten.
    pub fn insert(
        &mut self,
        first: GlyphId16,
        second: GlyphId16,
        record1: ValueRecord,
        record2: ValueRecord,
    ) {
        self.items
            .entry(first)
            .or_default()
            .insert(second, (record1, record2));
    }

    /// The number of glyph pairs in this builder.
    pub fn len(&self) -> usize {
        self.items.values().map(BTreeMap::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

impl Builder for PairPosBuilder {
    type Output = Vec<PairPos>;

    fn build(self) -> Self::Output {
        if self.items.is_empty() {
            return Default::default();
        }
        let coverage = self.items.keys().copied().collect();
        let pair_sets = self
            .items
            .into_values()
            .map(|seconds| {
                PairSet::new(
                    seconds
                        .into_iter()
                        .map(|(second, (rec1, rec2))| PairValueRecord::new(second, rec1, rec2))
                        .collect(),
                )
            })
            .collect();
        vec![PairPos::format_1(coverage, pair_sets)]
    }
}

type GlyphClass = BTreeSet<GlyphId16>;

/// A builder for class-based [`PairPos`] subtables (format 2).
///
/// Each first class becomes one row of the class matrix. Second classes are
/// numbered from 1; class 0 (every glyph not in a second class) has no
/// adjustment.
#[derive(Clone, Debug, Default)]
pub struct ClassPairPosBuilder {
    items: BTreeMap<GlyphClass, BTreeMap<GlyphClass, (ValueRecord, ValueRecord)>>,
}

impl ClassPairPosBuilder {
    /// Add the adjustments for a pair of glyph classes.
    ///
    /// A glyph should belong to only one first class and one second class.
    pub fn insert(
        &mut self,
        first_class: GlyphClass,
        second_class: GlyphClass,
        record1: ValueRecord,
        record2: ValueRecord,
    ) {
        self.items
            .entry(first_class)
            .or_default()
            .insert(second_class, (record1, record2));
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

impl Builder for ClassPairPosBuilder {
    type Output = Vec<PairPos>;

    fn build(self) -> Self::Output {
        if self.items.is_empty() {
            return Default::default();
        }

        let second_classes: BTreeSet<&GlyphClass> =
            self.items.values().flat_map(BTreeMap::keys).collect();
        let second_ids: BTreeMap<&GlyphClass, u16> = second_classes
            .iter()
            .enumerate()
            .map(|(i, class)| (*class, i as u16 + 1))
            .collect();
        let class2_count = second_ids.len() + 1;

        let mut class_def2 = ClassDefBuilder::default();
        for (class, id) in &second_ids {
            for gid in class.iter() {
                class_def2.add(*gid, *id);
            }
        }

        let mut class_def1 = ClassDefBuilder::default();
        let mut coverage = BTreeSet::new();
        let mut class1_records = Vec::with_capacity(self.items.len());
        for (id, (first, seconds)) in self.items.iter().enumerate() {
            for gid in first.iter() {
                class_def1.add(*gid, id as u16);
            }
            coverage.extend(first.iter().copied());

            let mut row = vec![Class2Record::default(); class2_count];
            for (second, (rec1, rec2)) in seconds {
                let col = second_ids.get(second).copied().unwrap_or_default() as usize;
                row[col] = Class2Record::new(rec1.clone(), rec2.clone());
            }
            class1_records.push(Class1Record::new(row));
        }

        vec![PairPos::format_2(
            coverage.into_iter().collect(),
            class_def1.build(),
            class_def2.build(),
            class1_records,
        )]
    }
}

/// The marks shared by the mark attachment builders.
#[derive(Clone, Debug, Default)]
struct MarkList {
    marks: BTreeMap<GlyphId16, (u16, AnchorTable)>,
}

impl MarkList {
    fn insert(&mut self, glyph: GlyphId16, class: u16, anchor: AnchorTable) {
        if let Some((prev_class, prev_anchor)) = self.marks.get(&glyph) {
            if *prev_class != class || *prev_anchor != anchor {
                log::warn!("mark glyph {glyph} redefined (class {prev_class} -> {class})");
            }
        }
        self.marks.insert(glyph, (class, anchor));
    }

    fn is_empty(&self) -> bool {
        self.marks.is_empty()
    }

    fn build(self) -> (CoverageTable, MarkArray) {
        let coverage = self.marks.keys().copied().collect();
        let array = MarkArray::new(
            self.marks
                .into_values()
                .map(|(class, anchor)| MarkRecord::new(class, anchor))
                .collect(),
        );
        (coverage, array)
    }
}

/// One row of an anchor matrix, with a column for each mark class.
fn anchor_row(anchors: BTreeMap<u16, AnchorTable>, class_count: u16) -> Vec<Option<AnchorTable>> {
    let mut row = vec![None; class_count as usize];
    for (class, anchor) in anchors {
        match row.get_mut(class as usize) {
            Some(slot) => *slot = Some(anchor),
            None => log::debug!("dropping anchor for unused mark class {class}"),
        }
    }
    row
}

/// A builder for [`MarkBasePosFormat1`] subtables.
#[derive(Clone, Debug, Default)]
pub struct MarkBasePosBuilder {
    marks: MarkList,
    bases: BTreeMap<GlyphId16, BTreeMap<u16, AnchorTable>>,
}

impl MarkBasePosBuilder {
    /// Add a mark glyph with its class and anchor.
    ///
    /// If the mark was already added, the new class and anchor replace the
    /// old ones.
    pub fn insert_mark(&mut self, glyph: GlyphId16, class: u16, anchor: AnchorTable) {
        self.marks.insert(glyph, class, anchor);
    }

    /// Add the anchor on a base glyph for marks of `class`.
    pub fn insert_base(&mut self, glyph: GlyphId16, class: u16, anchor: AnchorTable) {
        self.bases.entry(glyph).or_default().insert(class, anchor);
    }

    pub fn is_empty(&self) -> bool {
        self.marks.is_empty() || self.bases.is_empty()
    }
}

impl Builder for MarkBasePosBuilder {
    type Output = Vec<MarkBasePosFormat1>;

    fn build(self) -> Self::Output {
        if self.is_empty() {
            return Default::default();
        }
        let (mark_coverage, mark_array) = self.marks.build();
        let class_count = mark_array.class_count();
        let base_coverage = self.bases.keys().copied().collect();
        let rows = self
            .bases
            .into_values()
            .map(|anchors| anchor_row(anchors, class_count))
            .collect();
        vec![MarkBasePosFormat1::new(
            mark_coverage,
            base_coverage,
            mark_array,
            AnchorMatrix::new(rows),
        )]
    }
}

/// A builder for [`MarkLigPosFormat1`] subtables.
#[derive(Clone, Debug, Default)]
pub struct MarkLigPosBuilder {
    marks: MarkList,
    ligatures: BTreeMap<GlyphId16, Vec<BTreeMap<u16, AnchorTable>>>,
}

impl MarkLigPosBuilder {
    /// Add a mark glyph with its class and anchor.
    pub fn insert_mark(&mut self, glyph: GlyphId16, class: u16, anchor: AnchorTable) {
        self.marks.insert(glyph, class, anchor);
    }

    /// Add a ligature with the anchors of each of its components, by mark
    /// class.
    ///
    /// A component with no anchors is written as a row of null offsets.
    pub fn insert_ligature(
        &mut self,
        glyph: GlyphId16,
        component_anchors: Vec<BTreeMap<u16, AnchorTable>>,
    ) {
        if self.ligatures.insert(glyph, component_anchors).is_some() {
            log::warn!("ligature glyph {glyph} redefined");
        }
    }

    pub fn is_empty(&self) -> bool {
        self.marks.is_empty() || self.ligatures.is_empty()
    }
}

impl Builder for MarkLigPosBuilder {
    type Output = Vec<MarkLigPosFormat1>;

    fn build(self) -> Self::Output {
        if self.is_empty() {
            return Default::default();
        }
        let (mark_coverage, mark_array) = self.marks.build();
        let class_count = mark_array.class_count();
        let ligature_coverage = self.ligatures.keys().copied().collect();
        let attaches = self
            .ligatures
            .into_values()
            .map(|components| {
                AnchorMatrix::new(
                    components
                        .into_iter()
                        .map(|anchors| anchor_row(anchors, class_count))
                        .collect(),
                )
            })
            .collect();
        vec![MarkLigPosFormat1::new(
            mark_coverage,
            ligature_coverage,
            mark_array,
            LigatureArray::new(attaches),
        )]
    }
}

/// A builder for [`MarkMarkPosFormat1`] subtables.
#[derive(Clone, Debug, Default)]
pub struct MarkMarkPosBuilder {
    marks: MarkList,
    bases: BTreeMap<GlyphId16, BTreeMap<u16, AnchorTable>>,
}

impl MarkMarkPosBuilder {
    /// Add an attaching mark with its class and anchor.
    pub fn insert_mark1(&mut self, glyph: GlyphId16, class: u16, anchor: AnchorTable) {
        self.marks.insert(glyph, class, anchor);
    }

    /// Add the anchor on a base mark for attaching marks of `class`.
    pub fn insert_mark2(&mut self, glyph: GlyphId16, class: u16, anchor: AnchorTable) {
        self.bases.entry(glyph).or_default().insert(class, anchor);
    }

    pub fn is_empty(&self) -> bool {
        self.marks.is_empty() || self.bases.is_empty()
    }
}

impl Builder for MarkMarkPosBuilder {
    type Output = Vec<MarkMarkPosFormat1>;

    fn build(self) -> Self::Output {
        if self.is_empty() {
            return Default::default();
        }
        let (mark1_coverage, mark1_array) = self.marks.build();
        let class_count = mark1_array.class_count();
        let mark2_coverage = self.bases.keys().copied().collect();
        let rows = self
            .bases
            .into_values()
            .map(|anchors| anchor_row(anchors, class_count))
            .collect();
        vec![MarkMarkPosFormat1::new(
            mark1_coverage,
            mark2_coverage,
            mark1_array,
            AnchorMatrix::new(rows),
        )]
    }
}

/// A builder for [`CursivePosFormat1`] subtables.
#[derive(Clone, Debug, Default)]
pub struct CursivePosBuilder {
    // glyph -> (entry, exit)
    items: BTreeMap<GlyphId16, (Option<AnchorTable>, Option<AnchorTable>)>,
}

impl CursivePosBuilder {
    /// Set the entry and exit anchors of `glyph`.
    ///
    /// A glyph has a single pair of anchors; a later pair replaces an
    /// earlier one.
    pub fn insert(
        &mut self,
        glyph: GlyphId16,
        entry: Option<AnchorTable>,
        exit: Option<AnchorTable>,
    ) {
        let anchors = (entry, exit);
        if self.items.get(&glyph).is_some_and(|prev| *prev != anchors) {
            log::warn!("cursive anchors for glyph {glyph} redefined");
        }
        self.items.insert(glyph, anchors);
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

impl Builder for CursivePosBuilder {
    type Output = Vec<CursivePosFormat1>;

    fn build(self) -> Self::Output {
        if self.is_empty() {
            return Default::default();
        }
        let coverage = self.items.keys().copied().collect();
        let records = self
            .items
            .into_values()
            .map(|(entry, exit)| EntryExitRecord::new(entry, exit))
            .collect();
        vec![CursivePosFormat1::new(coverage, records)]
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use read::{tables::gpos as read_gpos, FontData, FontRead};

    use super::*;
    use crate::validate::Validate;

    fn glyph_class<const N: usize>(raw: [u16; N]) -> GlyphClass {
        raw.into_iter().map(GlyphId16::new).collect()
    }

    fn kern(x_advance: i16) -> ValueRecord {
        ValueRecord::new().with_x_advance(x_advance)
    }

    #[test]
    fn single_pos_all_equal() {
        let mut builder = SinglePosBuilder::default();
        builder.insert(GlyphId16::new(3), kern(20));
        builder.insert(GlyphId16::new(9), kern(20));
        let built = builder.build();
        let [SinglePos::Format1(table)] = built.as_slice() else {
            panic!("expected format 1: {built:?}");
        };
        assert_eq!(table.value_record, kern(20));
        assert_eq!(table.coverage.len(), 2);
    }

    #[test]
    fn single_pos_distinct_values() {
        let mut builder = SinglePosBuilder::default();
        builder.insert(GlyphId16::new(9), kern(20));
        builder.insert(GlyphId16::new(3), ValueRecord::new().with_y_placement(5));
        assert!(builder.can_add(GlyphId16::new(9), &kern(20)));
        assert!(!builder.can_add(GlyphId16::new(9), &kern(21)));
        let built = builder.build();
        let [SinglePos::Format2(table)] = built.as_slice() else {
            panic!("expected format 2: {built:?}");
        };
        // ordered by glyph
        assert_eq!(
            table.value_records,
            vec![ValueRecord::new().with_y_placement(5), kern(20)]
        );
    }

    #[test]
    fn pair_pos_builder() {
        let mut builder = PairPosBuilder::default();
        builder.insert(GlyphId16::new(10), GlyphId16::new(20), kern(-30), ValueRecord::new());
        builder.insert(GlyphId16::new(10), GlyphId16::new(15), kern(-10), ValueRecord::new());
        builder.insert(GlyphId16::new(2), GlyphId16::new(20), kern(5), ValueRecord::new());
        assert_eq!(builder.len(), 3);

        let built = builder.build();
        assert_eq!(built.len(), 1);
        built[0].validate().unwrap();

        let bytes = crate::dump_table(&built[0]).unwrap();
        let read_gpos::PairPos::Format1(table) =
            read_gpos::PairPos::read(FontData::new(&bytes)).unwrap()
        else {
            panic!("expected format 1");
        };
        let rec = table
            .get(GlyphId16::new(10), GlyphId16::new(15))
            .unwrap()
            .unwrap();
        assert_eq!(rec.value_record1.x_advance, Some(-10));
        assert!(table.get(GlyphId16::new(2), GlyphId16::new(15)).is_none());
    }

    #[test]
    fn class_pair_pos_builder() {
        let mut builder = ClassPairPosBuilder::default();
        builder.insert(glyph_class([1, 2]), glyph_class([7, 8]), kern(-50), ValueRecord::new());
        builder.insert(glyph_class([1, 2]), glyph_class([9]), kern(-20), ValueRecord::new());
        builder.insert(glyph_class([4]), glyph_class([9]), kern(15), ValueRecord::new());

        let built = builder.build();
        let [PairPos::Format2(table)] = built.as_slice() else {
            panic!("expected format 2: {built:?}");
        };
        // two first classes; two second classes plus class 0
        assert_eq!(table.class1_records.len(), 2);
        assert!(table
            .class1_records
            .iter()
            .all(|rec| rec.class2_records.len() == 3));
        assert_eq!(table.coverage.iter().count(), 3);
        built[0].validate().unwrap();

        let bytes = crate::dump_table(&built[0]).unwrap();
        let read_gpos::PairPos::Format2(read_back) =
            read_gpos::PairPos::read(FontData::new(&bytes)).unwrap()
        else {
            panic!("expected format 2");
        };
        let (rec1, _) = read_back
            .get_for_glyphs(GlyphId16::new(2), GlyphId16::new(8))
            .unwrap()
            .unwrap();
        assert_eq!(rec1.x_advance, Some(-50));
        let (rec1, _) = read_back
            .get_for_glyphs(GlyphId16::new(4), GlyphId16::new(9))
            .unwrap()
            .unwrap();
        assert_eq!(rec1.x_advance, Some(15));
        // class 0 in the second position has no adjustment
        let (rec1, _) = read_back
            .get_for_glyphs(GlyphId16::new(4), GlyphId16::new(100))
            .unwrap()
            .unwrap();
        assert_eq!(rec1.x_advance, Some(0));
        assert!(read_back
            .get_for_glyphs(GlyphId16::new(5), GlyphId16::new(9))
            .unwrap()
            .is_none());
    }

    #[test]
    fn mark_base_builder() {
        let mut builder = MarkBasePosBuilder::default();
        builder.insert_mark(GlyphId16::new(30), 0, AnchorTable::format_1(100, 0));
        builder.insert_mark(GlyphId16::new(31), 1, AnchorTable::format_1(100, 600));
        builder.insert_base(GlyphId16::new(10), 0, AnchorTable::format_1(250, 0));
        builder.insert_base(GlyphId16::new(11), 1, AnchorTable::format_1(300, 700));

        let built = builder.build();
        assert_eq!(built.len(), 1);
        let table = &built[0];
        assert_eq!(table.base_array.rows.len(), 2);
        assert!(table.base_array.rows[0][1].is_none());
        table.validate().unwrap();

        let bytes = crate::dump_table(table).unwrap();
        let read_back = read_gpos::MarkBasePosFormat1::read(FontData::new(&bytes)).unwrap();
        assert_eq!(read_back.mark_class_count(), 2);
        let (class, anchor) = read_back.mark_anchor(GlyphId16::new(31)).unwrap().unwrap();
        assert_eq!(class, 1);
        assert_eq!(anchor.y_coordinate(), 600);
        let base = read_back
            .base_anchor(GlyphId16::new(11), 1)
            .unwrap()
            .unwrap();
        assert_eq!(base.x_coordinate(), 300);
        assert!(read_back.base_anchor(GlyphId16::new(11), 0).is_none());
    }

    #[test]
    fn redefined_mark_replaces_earlier() {
        let _ = env_logger::builder().is_test(true).try_init();
        let mut builder = MarkMarkPosBuilder::default();
        builder.insert_mark1(GlyphId16::new(30), 0, AnchorTable::format_1(0, 0));
        builder.insert_mark1(GlyphId16::new(30), 1, AnchorTable::format_1(5, 5));
        builder.insert_mark2(GlyphId16::new(40), 1, AnchorTable::format_1(7, 7));
        let built = builder.build();
        let table = &built[0];
        assert_eq!(table.mark1_array.mark_records.len(), 1);
        assert_eq!(table.mark1_array.mark_records[0].mark_class, 1);
        assert_eq!(
            *table.mark2_array,
            AnchorMatrix::new(vec![vec![None, Some(AnchorTable::format_1(7, 7))]])
        );
        table.validate().unwrap();
    }

    #[test]
    fn mark_lig_builder() {
        let mut builder = MarkLigPosBuilder::default();
        builder.insert_mark(GlyphId16::new(30), 0, AnchorTable::format_1(100, 500));
        builder.insert_ligature(
            GlyphId16::new(50),
            vec![
                BTreeMap::from([(0, AnchorTable::format_1(200, 700))]),
                BTreeMap::new(),
                BTreeMap::from([(0, AnchorTable::format_2(900, 700, 4))]),
            ],
        );
        let built = builder.build();
        let table = &built[0];
        table.validate().unwrap();

        let bytes = crate::dump_table(table).unwrap();
        let read_back = read_gpos::MarkLigPosFormat1::read(FontData::new(&bytes)).unwrap();
        let anchor = read_back
            .ligature_anchor(GlyphId16::new(50), 2, 0)
            .unwrap()
            .unwrap();
        assert_eq!(anchor.x_coordinate(), 900);
        assert!(read_back
            .ligature_anchor(GlyphId16::new(50), 1, 0)
            .is_none());
    }

    #[test]
    fn empty_builders_produce_nothing() {
        assert!(SinglePosBuilder::default().build().is_empty());
        assert!(PairPosBuilder::default().build().is_empty());
        assert!(ClassPairPosBuilder::default().build().is_empty());
        let mut marks_only = MarkBasePosBuilder::default();
        marks_only.insert_mark(GlyphId16::new(1), 0, AnchorTable::default());
        assert!(marks_only.build().is_empty());
        assert!(MarkLigPosBuilder::default().build().is_empty());
        assert!(MarkMarkPosBuilder::default().build().is_empty());
        assert!(CursivePosBuilder::default().build().is_empty());
    }

    #[test]
    fn cursive_builder_later_anchors_win() {
        let _ = env_logger::builder().is_test(true).try_init();
        let mut builder = CursivePosBuilder::default();
        builder.insert(GlyphId16::new(12), Some(AnchorTable::format_1(0, 0)), None);
        builder.insert(
            GlyphId16::new(10),
            None,
            Some(AnchorTable::format_1(400, 0)),
        );
        builder.insert(
            GlyphId16::new(12),
            Some(AnchorTable::format_1(10, 5)),
            Some(AnchorTable::format_1(380, 5)),
        );
        let built = builder.build();
        let [table] = built.as_slice() else {
            panic!("expected one subtable: {built:?}");
        };
        assert!(table.validate().is_ok());
        assert_eq!(
            table.coverage.iter().collect::<Vec<_>>(),
            [GlyphId16::new(10), GlyphId16::new(12)]
        );
        assert!(table.entry_exit_records[0].entry_anchor.is_none());
        assert_eq!(
            table.entry_exit_records[1].entry_anchor.as_ref(),
            Some(&AnchorTable::format_1(10, 5))
        );

        let bytes = crate::dump_table(table).unwrap();
        let read_back = read_gpos::CursivePosFormat1::read(FontData::new(&bytes)).unwrap();
        let record = read_back.entry_exit_records()[1];
        let exit = record.exit_anchor(read_back.data()).unwrap().unwrap();
        assert_eq!(exit.x_coordinate(), 380);
    }
}
