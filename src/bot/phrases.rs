//! Hop-count phrase vocabulary for ping replies.
//!
//! Behavior:
//! - Stateless: a reply picks one phrase uniformly at random over the whole list
//! - The list is fixed and ordered; tests assert membership, never position
//! - Mostly Russian mesh-slang variations on "hops", kept verbatim from the
//!   vocabulary the bot has always answered with

use rand::Rng;

/// Phrases substituted for the word "hops" in a ping reply.
pub const PHRASES: [&str; 67] = [
    "hops",
    "хопов",
    "перескоков",
    "чпоков",
    "хлопов",
    "переходов",
    "ретрансляций",
    "пересылок",
    "узлов маршрута",
    "промежуточных узлов",
    "ретранс-узлов",
    "репитеров",
    "точек маршрута",
    "повторителей",
    "станций пути",
    "звеньев сети",
    "сегментов пути",
    "сегментов",
    "участков маршрута",
    "шагов",
    "промежутков",
    "этапов",
    "межузловых шагов",
    "ступеней",
    "звеньев",
    "пунктов",
    "пунктов пути",
    "пролётов",
    "связующих шагов",
    "прыжков",
    "прыжков сигнала",
    "перепрыгиваний",
    "прыжковых точек",
    "звеньев цепочки",
    "переправ",
    "мостиков",
    "промежуточных остановок",
    "станций пересадки",
    "длина пути",
    "длина маршрута",
    "попугаев",
    "обезьян",
    "цепочка узлов",
    "количество хопов в цепочке",
    "счётчик ретрансляций",
    "прыжков по сети",
    "мешков",
    "дистанция в хопах",
    "число ретрансляторов в пути",
    "количество узлов маршрута",
    "этапов передачи",
    "хрюков",
    "пуков сигнала",
    "жмяков",
    "чмяков связи",
    "тычков по эфиру",
    "бжиков",
    "квантовых прыжочков",
    "пшиков маршрута",
    "писков ретрансляции",
    "пинков сети",
    "лягушачьих прыгов",
    "вжухов",
    "энергетических хлопков",
    "микропрыжков",
    "топологических перепрыгиваний",
    "эфирных эхов",
];

/// Pick a random phrase, uniform over `[0, PHRASES.len())`.
pub fn pick() -> &'static str {
    let mut rng = rand::thread_rng();
    let idx = rng.gen_range(0..PHRASES.len());
    PHRASES[idx]
}
