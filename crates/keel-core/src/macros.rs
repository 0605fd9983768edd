/// Implements [`Entity`](crate::Entity) for a struct by listing its mapped
/// fields. The struct must be `Clone + Debug`, and every listed field type
/// must convert to and from [`Value`](crate::Value).
///
/// ```ignore
/// #[derive(Debug, Clone, Default)]
/// struct Employee {
///     id: i32,
///     name: String,
///     manager: Option<Object>,
/// }
///
/// keel_core::entity!(Employee { id, name, manager });
/// ```
#[macro_export]
macro_rules! entity {
    ( $ty:ty { $( $field:ident ),* $(,)? } ) => {
        impl $crate::Entity for $ty {
            fn get_field(&self, name: &str) -> ::core::option::Option<$crate::Value> {
                match name {
                    $(
                        stringify!($field) => {
                            ::core::option::Option::Some($crate::Value::from(self.$field.clone()))
                        }
                    )*
                    _ => ::core::option::Option::None,
                }
            }

            fn set_field(&mut self, name: &str, value: $crate::Value) -> $crate::Result<()> {
                match name {
                    $(
                        stringify!($field) => {
                            self.$field = $crate::value::FromValue::from_value(value)?;
                            ::core::result::Result::Ok(())
                        }
                    )*
                    _ => ::core::result::Result::Err($crate::Error::invalid_argument(format!(
                        "`{}` has no field `{}`",
                        stringify!($ty),
                        name
                    ))),
                }
            }

            fn field_names(&self) -> ::std::vec::Vec<::std::string::String> {
                ::std::vec![ $( stringify!($field).to_string() ),* ]
            }

            fn clone_entity(&self) -> ::std::boxed::Box<dyn $crate::Entity> {
                ::std::boxed::Box::new(::core::clone::Clone::clone(self))
            }

            fn as_any(&self) -> &dyn ::std::any::Any {
                self
            }

            fn into_any(self: ::std::boxed::Box<Self>) -> ::std::boxed::Box<dyn ::std::any::Any> {
                self
            }
        }
    };
}
