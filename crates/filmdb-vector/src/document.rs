use filmdb_core::types::Record;

/// The text a record is embedded from. Labelled lines, empty fields skipped.
pub fn embedding_text(record: &Record) -> String {
	let genres = record.genres.join(", ");
	let actors = record.actors.join(", ");
	let characters = record.characters.join(", ");
	let parts = [
		("Title", record.title.trim()),
		("Overview", record.overview.trim()),
		("Genres", genres.as_str()),
		("Director", record.director.trim()),
		("Actors", actors.as_str()),
		("Characters", characters.as_str()),
	];
	parts
		.iter()
		.filter(|(_, value)| !value.is_empty())
		.map(|(label, value)| format!("{label}: {value}"))
		.collect::<Vec<_>>()
		.join("\n")
}
