use crate::state::ObjectId;
use std::collections::{BTreeMap, HashMap};
use std::ops::Bound;
use std::vec::Vec;

/// Sequence number of an entry. Assigned on first insertion of an identity,
/// strictly increasing, never reused within one table.
/// 条目的序列号。在某个身份首次插入时分配，严格递增，同一表内永不复用。
pub(crate) type Seq = u64;

/// Identity-keyed, insertion-ordered table shared by every container.
///
/// Two structures are kept side by side:
/// - `index` maps an object identity to the sequence number of its entry.
/// - `entries` stores the entries ordered by sequence number.
///
/// Iterators remember the last sequence number they yielded and resume with
/// `next_after()`, so entries removed in between (by `detach()`, a collection
/// pass, or a release callback) are simply skipped.
///
/// 所有容器共享的、以身份为键、保持插入顺序的表。
/// 并列维护两个结构：
/// - `index` 将对象身份映射到其条目的序列号。
/// - `entries` 按序列号存储条目。
/// 迭代器记住上次产出的序列号并通过 `next_after()` 继续，
/// 因此期间被移除的条目会被直接跳过。
pub(crate) struct ObservationTable<E> {
    index: HashMap<ObjectId, Seq>,
    entries: BTreeMap<Seq, E>,
    next_seq: Seq,
}

impl<E> ObservationTable<E> {
    pub(crate) fn new() -> Self {
        Self {
            index: HashMap::new(),
            entries: BTreeMap::new(),
            next_seq: 0,
        }
    }

    #[inline]
    pub(crate) fn len(&self) -> usize {
        self.entries.len()
    }

    #[inline]
    pub(crate) fn contains(&self, id: ObjectId) -> bool {
        self.index.contains_key(&id)
    }

    pub(crate) fn get(&self, id: ObjectId) -> Option<&E> {
        let seq = self.index.get(&id)?;
        self.entries.get(seq)
    }

    /// Returns the entry for `id`, inserting `make()` at the end of the
    /// iteration order when the identity is not present yet.
    ///
    /// 返回 `id` 对应的条目；若身份尚不存在，则在迭代顺序末尾插入 `make()`。
    pub(crate) fn get_or_insert_with(&mut self, id: ObjectId, make: impl FnOnce() -> E) -> &mut E {
        let next_seq = &mut self.next_seq;
        let seq = *self.index.entry(id).or_insert_with(|| {
            let seq = *next_seq;
            *next_seq += 1;
            seq
        });

        self.entries.entry(seq).or_insert_with(make)
    }

    /// Insert or replace the entry for `id`.
    ///
    /// A replaced entry keeps its position in the iteration order and is
    /// returned to the caller, who decides when it is dropped.
    ///
    /// 插入或替换 `id` 的条目。
    /// 被替换的条目保留其迭代位置，并返回给调用者，由调用者决定何时 drop。
    pub(crate) fn insert(&mut self, id: ObjectId, entry: E) -> Option<E> {
        match self.index.get(&id) {
            Some(seq) => self.entries.insert(*seq, entry),
            None => {
                let seq = self.next_seq;
                self.next_seq += 1;
                self.index.insert(id, seq);
                self.entries.insert(seq, entry);
                None
            }
        }
    }

    pub(crate) fn remove(&mut self, id: ObjectId) -> Option<E> {
        let seq = self.index.remove(&id)?;
        self.entries.remove(&seq)
    }

    /// First entry after `cursor` in iteration order (`None` starts from the
    /// beginning) that satisfies `pred`.
    ///
    /// 在迭代顺序中位于 `cursor` 之后（`None` 表示从头开始）且满足 `pred` 的第一个条目。
    pub(crate) fn next_after(
        &self,
        cursor: Option<Seq>,
        mut pred: impl FnMut(&E) -> bool,
    ) -> Option<(Seq, &E)> {
        let lower = match cursor {
            Some(seq) => Bound::Excluded(seq),
            None => Bound::Unbounded,
        };

        self.entries
            .range((lower, Bound::Unbounded))
            .find(|(_, entry)| pred(entry))
            .map(|(seq, entry)| (*seq, entry))
    }

    /// Remove and return every entry for which `pred` holds, in iteration order.
    ///
    /// 移除并按迭代顺序返回所有满足 `pred` 的条目。
    pub(crate) fn extract_if(&mut self, mut pred: impl FnMut(&E) -> bool) -> Vec<E> {
        let doomed: Vec<Seq> = self
            .entries
            .iter()
            .filter(|(_, entry)| pred(entry))
            .map(|(seq, _)| *seq)
            .collect();

        if doomed.is_empty() {
            return Vec::new();
        }

        self.index.retain(|_, seq| doomed.binary_search(seq).is_err());

        doomed
            .iter()
            .filter_map(|seq| self.entries.remove(seq))
            .collect()
    }

    /// Remove every entry, in iteration order.
    /// 按迭代顺序移除所有条目。
    pub(crate) fn drain(&mut self) -> Vec<E> {
        self.index.clear();
        std::mem::take(&mut self.entries).into_values().collect()
    }
}
