/// Unwraps an `Err`, panicking with the `Ok` value otherwise. Extra
/// format arguments are appended to the panic message.
#[macro_export]
macro_rules! assert_err {
    ($e:expr $(, $($t:tt)* )?) => {
        match $e {
            Err(e) => e,
            actual => {
                use std::fmt::Write;
                let mut msg = format!("expected `Err`; actual={:?}", actual);

                $(
                    write!(msg, ", ").unwrap();
                    write!(msg, $($t)*).unwrap();
                )?

                panic!("{}", msg);
            }
        }
    };
}

#[macro_export]
macro_rules! assert_ok {
    ($e:expr) => {
        match $e {
            Ok(v) => v,
            Err(e) => panic!("expected `Ok`; error={}", e),
        }
    };
}

/// Asserts that a result failed with the given SQLSTATE and returns the
/// error for further inspection.
#[macro_export]
macro_rules! assert_sqlstate {
    ($e:expr, $sqlstate:expr) => {{
        let err = $crate::assert_err!($e);
        assert_eq!(
            err.sqlstate(),
            Some($sqlstate),
            "unexpected sqlstate; error={}",
            err
        );
        err
    }};
}
