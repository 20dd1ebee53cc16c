#[cfg(test)]
pub mod test {
    use crate::document::Document;
    use crate::error::ConversionError;
    use crate::value::{Handle, Value};

    /// A document that sets every built-in kind under `[test]` to "1".
    pub const ALL_ONES: &str = r#"
[test]
bool = true
int = 1
int64 = 1
uint = 1
uint64 = 1
string = "1"
float64 = 1.0
duration = "1s"
"#;

    /// Distinct values for every built-in kind under `[test]`.
    pub const DISTINCT: &str = r#"
[test]
bool = true
int = 22
int64 = 23
uint = 24
uint64 = 25
string = "hello"
float64 = 2718e28
duration = "2m"
"#;

    /// Collects the strings found at each comma-separated sub-path.
    pub struct StringList(pub Handle<Vec<String>>);

    impl Value for StringList {
        fn render(&self) -> String {
            self.0.with(|items| format!("{items:?}"))
        }

        fn assign(&mut self, path: &str, document: &Document) -> Result<(), ConversionError> {
            for sub_path in path.split(',') {
                let Some(node) = document.lookup(sub_path) else {
                    return Ok(());
                };
                let item = node
                    .as_str()
                    .ok_or_else(|| ConversionError::custom(format!("{sub_path} is not a string")))?;
                let mut items = self.0.get();
                items.push(item.to_string());
                self.0.set(items);
            }
            Ok(())
        }
    }

    /// Counts how many comma-separated sub-paths hold `true`.
    ///
    /// Accumulates across assignments, so parsing twice counts twice.
    pub struct TrueCounter(pub Handle<usize>);

    impl Value for TrueCounter {
        fn render(&self) -> String {
            self.0.get().to_string()
        }

        fn assign(&mut self, path: &str, document: &Document) -> Result<(), ConversionError> {
            for sub_path in path.split(',') {
                let Some(node) = document.lookup(sub_path) else {
                    return Ok(());
                };
                let flag = node
                    .as_bool()
                    .ok_or_else(|| ConversionError::custom(format!("{sub_path} is not a bool")))?;
                if flag {
                    self.0.set(self.0.get() + 1);
                }
            }
            Ok(())
        }
    }
}
