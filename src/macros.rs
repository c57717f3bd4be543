#![allow(unused_macros)]

// ----------------------
// Parsing related Macros
// ----------------------

macro_rules! alt {
    ($e:expr $(,)*) => (
        match $e? {
            Some(res) => Some(res),
            None => None,
        }
    );

    ($e:expr, $($tt:tt)*) => (
        match $e? {
            Some(res) => Some(res),
            None => {
                alt!($($tt)*)
            }
        }
    )
}

// ----------------------
// Testing related Macros
// ----------------------

macro_rules! should_fail {
    ($errs:ident, $func:ident, $iter:expr) => ({
        for item in $iter.iter() {
            if let Ok(_) = $func(item) {
                $errs.push(format!("{:?} - should have errored.\n", item));
            }
        }
    })
}

macro_rules! should_pass {
    ($errs:ident, $func:ident, $iter:expr) => ({
        for item in $iter.iter() {
            if let Err(s) = $func(item) {
                $errs.push(format!("{:?} - should have passed.\n\tError: {:?}\n", item, s));
            }
        }
    })
}

// Trees from distinct inputs carry distinct source spans, so equality checks
// go through the serialized form, which drops spans.
macro_rules! tree_json {
    ($res:expr) => (
        $res.map(|nodes| serde_json::to_value(&nodes).expect("tree serialization"))
    )
}

macro_rules! should_equate {
    ($errs:ident, $func:ident, $iter:expr) => ({
        for &(l, r) in $iter.iter() {
            let l_res = tree_json!($func(l));
            let r_res = tree_json!($func(r));
            if l_res != r_res {
                $errs.push(format!("{:?} and {:?} - should have yielded the same results.\n\n\tLeft:  {:?}\n\n\tRight: {:?}",
                    l, r, l_res, r_res));
            }
        }
    })
}

macro_rules! should_differ {
    ($errs:ident, $func:ident, $iter:expr) => ({
        for &(l, r) in $iter.iter() {
            let l_res = tree_json!($func(l));
            let r_res = tree_json!($func(r));
            if l_res == r_res {
                $errs.push(format!("{:?} and {:?} - should have yielded different results.\n\n\tLeft:  {:?}\n\n\tRight: {:?}",
                    l, r, l_res, r_res));
            }
        }
    })
}

macro_rules! display_errors {
    ($errs:ident) => (
        if $errs.len() > 0 {
            for err in $errs {
                println!("\n{}", err);
            }
            panic!();
        }
    )
}
