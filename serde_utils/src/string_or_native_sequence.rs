// Sequences of integers in Beacon API responses, such as committee members.
// Each element may be a string or a native number. See `string_or_native`.

use core::{
    fmt::{Display, Formatter, Result as FmtResult},
    marker::PhantomData,
    str::FromStr,
};

use serde::{
    de::{SeqAccess, Visitor},
    Deserialize, Deserializer, Serialize, Serializer,
};

#[derive(Deserialize, Serialize)]
#[serde(bound(
    deserialize = "T: Deserialize<'de> + FromStr<Err: Display>",
    serialize = "T: Display",
))]
struct Element<T>(#[serde(with = "crate::string_or_native")] T);

pub fn deserialize<'de, I, T, D>(deserializer: D) -> Result<T, D::Error>
where
    I: Deserialize<'de> + FromStr<Err: Display>,
    T: FromIterator<I>,
    D: Deserializer<'de>,
{
    struct SequenceVisitor<I, T>(PhantomData<(I, T)>);

    impl<'de, I, T> Visitor<'de> for SequenceVisitor<I, T>
    where
        I: Deserialize<'de> + FromStr<Err: Display>,
        T: FromIterator<I>,
    {
        type Value = T;

        fn expecting(&self, formatter: &mut Formatter) -> FmtResult {
            formatter.write_str("a sequence of unsigned integers or strings containing them")
        }

        fn visit_seq<S: SeqAccess<'de>>(self, mut seq: S) -> Result<Self::Value, S::Error> {
            core::iter::from_fn(|| seq.next_element::<Element<I>>().transpose())
                .map(|element| element.map(|Element(item)| item))
                .collect()
        }
    }

    deserializer.deserialize_seq(SequenceVisitor(PhantomData))
}

pub fn serialize<S: Serializer>(
    items: impl IntoIterator<Item = impl Display>,
    serializer: S,
) -> Result<S::Ok, S::Error> {
    serializer.collect_seq(items.into_iter().map(Element))
}
