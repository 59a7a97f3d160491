use bean_container::Marker;
use bean_macros::Marker;

#[derive(Debug, Marker)]
enum Level {
    Info,
    Warn,
}

#[derive(Debug, Marker)]
struct Timed<T>
where
    T: std::fmt::Debug + Send + Sync + 'static,
{
    label: T,
}

fn require<M: Marker>(_: M) {}

fn main() {
    require(Level::Info);
    require(Level::Warn);
    require(Timed { label: "query" });
}
