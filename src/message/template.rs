use std::error::Error as StdError;

use crate::Error;

/// A template engine bodies and attachments can be rendered with
///
/// The engine is owned by the caller, the message only keeps the rendered output.
///
/// ```
/// use std::{collections::HashMap, fmt};
/// use missive::message::TemplateEngine;
///
/// struct Greetings(HashMap<&'static str, &'static str>);
///
/// #[derive(Debug)]
/// struct NoError;
///
/// impl fmt::Display for NoError {
///     fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
///         f.write_str("no error")
///     }
/// }
///
/// impl std::error::Error for NoError {}
///
/// impl TemplateEngine<str> for Greetings {
///     type Error = NoError;
///
///     fn contains(&self, name: &str) -> bool {
///         self.0.contains_key(name)
///     }
///
///     fn render(&self, name: &str, data: &str) -> Result<String, NoError> {
///         Ok(self.0[name].replace("{}", data))
///     }
/// }
///
/// let mut templates = HashMap::new();
/// templates.insert("hello", "Hello {}!");
/// let engine = Greetings(templates);
/// assert_eq!(engine.render("hello", "world").unwrap(), "Hello world!");
/// ```
pub trait TemplateEngine<D: ?Sized> {
    type Error: StdError + Send + Sync + 'static;

    /// Whether a template called `name` is registered
    fn contains(&self, name: &str) -> bool;

    fn render(&self, name: &str, data: &D) -> Result<String, Self::Error>;
}

/// Renders `name`, attributing failures to `operation`
pub(crate) fn render<E, D>(
    operation: &'static str,
    engine: &E,
    name: &str,
    data: &D,
) -> Result<String, Error>
where
    E: TemplateEngine<D> + ?Sized,
    D: ?Sized,
{
    if !engine.contains(name) {
        return Err(Error::TemplateMissing {
            operation,
            name: name.to_owned(),
        });
    }

    engine.render(name, data).map_err(|e| Error::Template {
        operation,
        source: Box::new(e),
    })
}

#[cfg(test)]
mod test {
    use super::{render, TemplateEngine};
    use crate::Error;
    use std::{fmt, io};

    struct Upper;

    impl TemplateEngine<str> for Upper {
        type Error = io::Error;

        fn contains(&self, name: &str) -> bool {
            name == "upper" || name == "broken"
        }

        fn render(&self, name: &str, data: &str) -> Result<String, io::Error> {
            match name {
                "upper" => Ok(data.to_uppercase()),
                _ => Err(io::Error::new(io::ErrorKind::Other, "broken template")),
            }
        }
    }

    fn message<T: fmt::Debug>(result: Result<T, Error>) -> String {
        result.unwrap_err().to_string()
    }

    #[test]
    fn renders() {
        assert_eq!(
            render("set_body_template", &Upper, "upper", "hi").unwrap(),
            "HI"
        );
    }

    #[test]
    fn missing_template() {
        assert_eq!(
            message(render("attach_template", &Upper, "lower", "hi")),
            "attach_template: template \"lower\" is not registered"
        );
    }

    #[test]
    fn failing_template() {
        assert_eq!(
            message(render("embed_template", &Upper, "broken", "hi")),
            "embed_template: failed to execute template: broken template"
        );
    }
}
