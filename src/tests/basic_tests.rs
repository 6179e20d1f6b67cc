/// 基础测试模块
/// 测试各容器核心操作的正确性

use super::Tally;
use crate::{ObservableCaptureSet, ObservableMap, ObservableSet, ObservableWeakMap, WatchMap, WatchSet};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

/// 测试1: 创建空集合
#[test]
fn test_set_create_empty() {
    let set: ObservableSet<i32> = ObservableSet::new();

    assert_eq!(set.count(), 0);
    assert!(set.is_empty());
    assert_eq!(set.iter().count(), 0);
}

/// 测试2: watch 一个对象
#[test]
fn test_set_watch() {
    let set = ObservableSet::new();
    let object = Arc::new(1i32);

    let _object = set.watch(object, |_| {});

    assert_eq!(set.count(), 1);
}

/// 测试3: watch 原样返回对象
#[test]
fn test_set_watch_returns_object() {
    let set = ObservableSet::new();
    let object = Arc::new(String::from("entry"));

    let returned = set.watch(object.clone(), |_| {});

    assert!(Arc::ptr_eq(&object, &returned));
    assert!(set.contains(&object));
}

/// 测试4: detach 立即触发回调，回调收到的是同一个对象
#[test]
fn test_set_detach_fires_with_same_object() {
    let set = ObservableSet::new();
    let object = Arc::new(7u64);
    let received = Arc::new(Mutex::new(None));

    let slot = received.clone();
    set.watch(object.clone(), move |released| {
        *slot.lock().unwrap() = Some(released);
    });

    set.detach(&object);

    let released = received.lock().unwrap().take().expect("callback not fired");
    assert!(Arc::ptr_eq(&object, &released));
    assert_eq!(set.count(), 0);
    assert!(!set.contains(&object));
}

/// 测试5: 重复 detach 只触发一次
#[test]
fn test_set_detach_twice_fires_once() {
    let set = ObservableSet::new();
    let tally = Tally::new();
    let object = set.watch(Arc::new(1u8), tally.hook());

    set.detach(&object);
    set.detach(&object);

    assert_eq!(tally.fired(), 1);
}

/// 测试6: detach 未注册的对象是空操作
#[test]
fn test_set_detach_absent_is_noop() {
    let set = ObservableSet::new();
    let tally = Tally::new();
    let watched = set.watch(Arc::new(1u8), tally.hook());
    let stranger = Arc::new(1u8);

    set.detach(&stranger);

    assert_eq!(tally.fired(), 0);
    assert_eq!(set.count(), 1);
    drop(watched);
}

/// 测试7: 迭代保持插入顺序
#[test]
fn test_set_iterator_order() {
    let set = ObservableSet::new();
    let object1 = set.watch(Arc::new("first"), |_| {});
    let object2 = set.watch(Arc::new("second"), |_| {});

    let items: Vec<_> = set.iter().collect();

    assert_eq!(items.len(), 2);
    assert!(Arc::ptr_eq(&items[0], &object1));
    assert!(Arc::ptr_eq(&items[1], &object2));
}

/// 测试8: 迭代可重新开始
#[test]
fn test_set_iterator_restartable() {
    let set = ObservableSet::new();
    let _a = set.watch(Arc::new(1), |_| {});
    let _b = set.watch(Arc::new(2), |_| {});

    let first: Vec<i32> = set.iter().map(|item| *item).collect();
    let second: Vec<i32> = (&set).into_iter().map(|item| *item).collect();

    assert_eq!(first, vec![1, 2]);
    assert_eq!(first, second);
}

/// 测试9: 同一对象多次 watch，detach 触发所有回调
#[test]
fn test_set_multiple_watch_same_object() {
    let set = ObservableSet::new();
    let object = Arc::new(0u32);
    let callback1_called = Arc::new(AtomicBool::new(false));
    let callback2_called = Arc::new(AtomicBool::new(false));

    let flag = callback1_called.clone();
    set.watch(object.clone(), move |_| flag.store(true, Ordering::SeqCst));
    let flag = callback2_called.clone();
    set.watch(object.clone(), move |_| flag.store(true, Ordering::SeqCst));

    // 同一身份只计数一次
    assert_eq!(set.count(), 1);
    assert_eq!(set.iter().count(), 1);

    set.detach(&object);

    assert!(callback1_called.load(Ordering::SeqCst));
    assert!(callback2_called.load(Ordering::SeqCst));
}

/// 测试10: 捕获集合的基本操作
#[test]
fn test_capture_set_basics() {
    let set = ObservableCaptureSet::new();
    let tally = Tally::new();

    assert_eq!(set.count(), 0);

    let object1 = set.watch(Arc::new(10), tally.hook());
    let object2 = set.watch(Arc::new(20), tally.hook());

    assert_eq!(set.count(), 2);
    assert!(set.contains(&object1));

    let items: Vec<i32> = set.iter().map(|item| *item).collect();
    assert_eq!(items, vec![10, 20]);

    set.detach(&object1);
    assert_eq!(tally.fired(), 1);
    assert_eq!(set.count(), 1);

    set.detach(&object1);
    assert_eq!(tally.fired(), 1);
    drop(object2);
}

/// 测试11: 捕获集合同一对象多次 watch，detach 触发全部
#[test]
fn test_capture_set_multiple_watch_same_object() {
    let set = ObservableCaptureSet::new();
    let tally = Tally::new();
    let object = Arc::new(String::from("shared"));

    set.watch(object.clone(), tally.hook());
    set.watch(object.clone(), tally.hook());
    set.watch(object.clone(), tally.hook());

    assert_eq!(set.count(), 1);

    set.detach(&object);

    assert_eq!(tally.fired(), 3);
}

/// 测试12: 捕获集合 clear 释放一切
#[test]
fn test_capture_set_clear() {
    let set = ObservableCaptureSet::new();
    let tally = Tally::new();

    for i in 0..5 {
        set.watch(Arc::new(i), tally.hook());
    }

    set.clear();

    assert_eq!(tally.fired(), 5);
    assert!(set.is_empty());
}

/// 测试13: 弱键映射创建为空
#[test]
fn test_weak_map_create_empty() {
    let map: ObservableWeakMap<u32, u32> = ObservableWeakMap::new();

    assert_eq!(map.count(), 0);
    assert!(map.is_empty());
}

/// 测试14: 弱键映射 watch 与 find
#[test]
fn test_weak_map_watch_and_find() {
    let map = ObservableWeakMap::new();
    let key = Arc::new("key");
    let value = Arc::new(vec![1u8, 2, 3]);

    let returned = map.watch(key.clone(), value.clone(), |_| {});

    assert!(Arc::ptr_eq(&key, &returned));
    assert_eq!(map.count(), 1);
    assert!(map.has(&key));

    let found = map.find(&key).expect("value missing");
    assert!(Arc::ptr_eq(&found, &value));
}

/// 测试15: 查找不存在的键
#[test]
fn test_weak_map_find_non_existent() {
    let map: ObservableWeakMap<u32, u32> = ObservableWeakMap::new();
    let key = Arc::new(1);

    assert!(map.find(&key).is_none());
    assert!(!map.has(&key));
}

/// 测试16: 弱键映射迭代顺序
#[test]
fn test_weak_map_iterator() {
    let map = ObservableWeakMap::new();
    let key1 = map.watch(Arc::new(1), Arc::new("one"), |_| {});
    let key2 = map.watch(Arc::new(2), Arc::new("two"), |_| {});

    let items: Vec<_> = map.iter().collect();

    assert_eq!(items.len(), 2);
    assert!(Arc::ptr_eq(&items[0].0, &key1));
    assert_eq!(*items[0].1, "one");
    assert!(Arc::ptr_eq(&items[1].0, &key2));
    assert_eq!(*items[1].1, "two");
}

/// 测试17: 同一键多次 watch：单值语义，被替换的回调立即触发
#[test]
fn test_weak_map_multiple_values_for_same_key() {
    let map = ObservableWeakMap::new();
    let replaced = Arc::new(Mutex::new(Vec::new()));
    let key = Arc::new(0u8);

    let log = replaced.clone();
    map.watch(key.clone(), Arc::new("value1"), move |value| {
        log.lock().unwrap().push(*value);
    });
    let log = replaced.clone();
    map.watch(key.clone(), Arc::new("value2"), move |value| {
        log.lock().unwrap().push(*value);
    });

    assert_eq!(map.count(), 1);
    assert_eq!(map.find(&key).as_deref(), Some(&"value2"));
    assert_eq!(*replaced.lock().unwrap(), vec!["value1"]);

    map.detach(&key);
    assert_eq!(*replaced.lock().unwrap(), vec!["value1", "value2"]);
}

/// 测试18: 替换保留迭代位置
#[test]
fn test_weak_map_replacement_keeps_position() {
    let map = ObservableWeakMap::new();
    let key1 = map.watch(Arc::new(1), Arc::new(10), |_| {});
    let key2 = map.watch(Arc::new(2), Arc::new(20), |_| {});

    map.watch(key1.clone(), Arc::new(11), |_| {});

    let values: Vec<i32> = map.iter().map(|(_, value)| *value).collect();
    assert_eq!(values, vec![11, 20]);
    drop(key2);
}

/// 测试19: 强键映射的基本操作
#[test]
fn test_map_basics() {
    let map = ObservableMap::new();
    let tally = Tally::new();
    let key = map.watch(Arc::new("id"), Arc::new(42u64), tally.hook());

    assert!(map.has(&key));
    assert_eq!(map.find(&key).as_deref(), Some(&42));
    assert_eq!(map.count(), 1);

    map.watch(key.clone(), Arc::new(43u64), tally.hook());
    assert_eq!(tally.fired(), 1);
    assert_eq!(map.find(&key).as_deref(), Some(&43));

    map.detach(&key);
    map.detach(&key);
    assert_eq!(tally.fired(), 2);
    assert!(!map.has(&key));
    assert!(map.find(&key).is_none());
}

/// 测试20: 通过通用契约使用容器
#[test]
fn test_generic_contracts() {
    fn exercise_set<S: WatchSet<u32>>(set: &S) -> usize {
        let tally = Tally::new();
        let object = set.watch(Arc::new(5), tally.hook());
        assert_eq!(set.count(), 1);
        set.detach(&object);
        set.detach(&object);
        tally.fired()
    }

    fn exercise_map<M: WatchMap<u32, u32>>(map: &M) -> usize {
        let tally = Tally::new();
        let key = map.watch(Arc::new(1), Arc::new(2), tally.hook());
        assert!(map.has(&key));
        assert_eq!(map.find(&key).as_deref(), Some(&2));
        map.detach(&key);
        assert_eq!(map.count(), 0);
        tally.fired()
    }

    assert_eq!(exercise_set(&ObservableSet::new()), 1);
    assert_eq!(exercise_set(&ObservableCaptureSet::new()), 1);
    assert_eq!(exercise_map(&ObservableMap::new()), 1);
    assert_eq!(exercise_map(&ObservableWeakMap::new()), 1);
}
