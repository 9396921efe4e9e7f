//! Macros for defining entity schemas.
//!
//! The [`define_entity!`] macro generates column constants for a table,
//! tying database column names to Rust types.

/// Defines a module with typed column constants for a database table.
///
/// This macro generates a public module containing `const` declarations
/// for each column, making it easy to reference columns in queries.
///
/// # Syntax
///
/// ```ignore
/// define_entity!(
///     users {
///         table: "users",
///         columns: {
///             ID: i64 => "id",
///             NAME: String => "name"
///         }
///     }
/// );
/// ```
///
/// This expands to:
///
/// ```ignore
/// pub mod users {
///     pub const TABLE: &str = "users";
///     pub const ID: rowkit::Col<i64> = rowkit::Col::new("id");
///     pub const NAME: rowkit::Col<String> = rowkit::Col::new("name");
/// }
/// ```
#[macro_export]
macro_rules! define_entity {
    (
        $entity:ident {
            table: $table:literal,
            columns: {
                $($col_name:ident: $col_type:ty => $db_col:literal),* $(,)?
            }
        }
    ) => {
        pub mod $entity {
            use $crate::expr::column::Col;

            pub const TABLE: &str = $table;

            $(
                $crate::define_column!($col_name, $col_type, $db_col);
            )*
        }
    };
}

#[macro_export]
macro_rules! define_column {
    // JSON detection - Vec<T>
    ($name:ident, Vec<$inner:ty>, $db_col:literal) => {
        pub const $name: Col<String> = Col::json($db_col);
    };

    // JSON detection - Option<Vec<T>>
    ($name:ident, Option<Vec<$inner:ty>>, $db_col:literal) => {
        pub const $name: Col<Option<String>> = Col::json($db_col);
    };

    // Optional regular types
    ($name:ident, Option<$inner:ty>, $db_col:literal) => {
        pub const $name: Col<Option<$inner>> = Col::new($db_col);
    };

    // Regular types (fallback)
    ($name:ident, $type:ty, $db_col:literal) => {
        pub const $name: Col<$type> = Col::new($db_col);
    };
}

/// Builds a [`crate::fields::FieldMap`] from literal field names.
///
/// ```ignore
/// let criteria = field_map! {
///     "org_id" => 7,
///     "email" => "a@b.c".to_string(),
/// };
/// ```
#[macro_export]
macro_rules! field_map {
    () => {
        $crate::fields::FieldMap::new()
    };
    ($($key:literal => $value:expr),* $(,)?) => {{
        let mut map = $crate::fields::FieldMap::new();
        $(
            map.insert($key.to_string(), ::rusqlite::types::Value::from($value));
        )*
        map
    }};
}
