use std::borrow::Cow;
use std::fmt;

/// An owned or borrowed string.
pub type SharedString = Cow<'static, str>;

/// The key of a tag.
///
/// Views group recorded values by a list of tag keys, referred to as the view's columns.
#[derive(Clone, Debug, Eq, Hash, PartialEq, PartialOrd, Ord)]
pub struct TagKey(SharedString);

impl TagKey {
    /// Creates a [`TagKey`].
    pub fn new<K>(key: K) -> Self
    where
        K: Into<SharedString>,
    {
        TagKey(key.into())
    }

    /// Creates a [`TagKey`] from a static string.
    pub const fn from_static(key: &'static str) -> Self {
        TagKey(Cow::Borrowed(key))
    }

    /// Gets the key as a string slice.
    pub fn as_str(&self) -> &str {
        self.0.as_ref()
    }
}

impl fmt::Display for TagKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<&'static str> for TagKey {
    fn from(key: &'static str) -> TagKey {
        TagKey::from_static(key)
    }
}

impl From<String> for TagKey {
    fn from(key: String) -> TagKey {
        TagKey(Cow::Owned(key))
    }
}

/// Context attached to a recording, in the form of a key/value pair.
///
/// For example, in a web service, a request latency measurement might be tagged with the region
/// serving the request and the HTTP method used.  Views pick out the tags they care about; tags
/// that no view groups by are ignored.
#[derive(Clone, Debug, Eq, Hash, PartialEq)]
pub struct Tag(TagKey, SharedString);

impl Tag {
    /// Creates a [`Tag`] from a key and value.
    pub fn new<K, V>(key: K, value: V) -> Self
    where
        K: Into<TagKey>,
        V: Into<SharedString>,
    {
        Tag(key.into(), value.into())
    }

    /// Creates a [`Tag`] from a static key and value.
    pub const fn from_static_parts(key: &'static str, value: &'static str) -> Self {
        Tag(TagKey::from_static(key), Cow::Borrowed(value))
    }

    /// Key of this tag.
    pub fn key(&self) -> &TagKey {
        &self.0
    }

    /// Value of this tag.
    pub fn value(&self) -> &str {
        self.1.as_ref()
    }

    /// Consumes this [`Tag`], returning the key and value.
    pub fn into_parts(self) -> (TagKey, SharedString) {
        (self.0, self.1)
    }
}

/// A value that can be read as a tag.
///
/// Lets recording accept [`Tag`]s as well as plain `(key, value)` string pairs without
/// converting them first.
pub trait AsTag {
    /// Key of the tag.
    fn tag_key(&self) -> &str;

    /// Value of the tag.
    fn tag_value(&self) -> &str;
}

impl AsTag for Tag {
    fn tag_key(&self) -> &str {
        self.0.as_str()
    }

    fn tag_value(&self) -> &str {
        self.value()
    }
}

impl<K, V> AsTag for (K, V)
where
    K: AsRef<str>,
    V: AsRef<str>,
{
    fn tag_key(&self) -> &str {
        self.0.as_ref()
    }

    fn tag_value(&self) -> &str {
        self.1.as_ref()
    }
}

impl<T> AsTag for &T
where
    T: AsTag + ?Sized,
{
    fn tag_key(&self) -> &str {
        (**self).tag_key()
    }

    fn tag_value(&self) -> &str {
        (**self).tag_value()
    }
}

/// Projects `tags` onto `columns`.
///
/// Returns one value per column, in column order.  When a tag key appears more than once, the
/// last value wins.  Columns with no matching tag get an empty value.
pub(crate) fn project<T>(columns: &[TagKey], tags: &[T]) -> Vec<String>
where
    T: AsTag,
{
    let mut values = vec![String::new(); columns.len()];
    for tag in tags {
        let key = tag.tag_key();
        for (idx, column) in columns.iter().enumerate() {
            if column.as_str() == key {
                values[idx].clear();
                values[idx].push_str(tag.tag_value());
            }
        }
    }
    values
}
