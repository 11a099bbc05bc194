/// Define a configuration struct with its defaults inline
///
/// ```ignore
/// config_struct! {
///     pub struct ThresholdsConfig {
///         min_transaction_size: f64 = 10.0,
///         min_transactions_for_trending: u64 = 50,
///     }
/// }
/// ```
///
/// Generates the struct with public fields, a `Default` impl using the given
/// values, and serde support with `#[serde(default)]` so partial TOML files
/// fall back to the defaults field by field.
#[macro_export]
macro_rules! config_struct {
    (
        $(#[$meta:meta])*
        $vis:vis struct $name:ident {
            $(
                $(#[$field_meta:meta])*
                $field_name:ident: $field_type:ty = $default_value:expr
            ),*
            $(,)?
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
        #[serde(default)]
        $vis struct $name {
            $(
                $(#[$field_meta])*
                pub $field_name: $field_type,
            )*
        }

        impl Default for $name {
            fn default() -> Self {
                Self {
                    $(
                        $field_name: $default_value,
                    )*
                }
            }
        }
    };
}
