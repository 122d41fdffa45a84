//! Caption table creation from formatted records.

use crate::{
    common::*,
    error::*,
    record::{Caption, CaptionRecord, DatasetFile, FormattedRecord, ImageRecord},
};
use caption_text::{Tokenizer, WordCounter, EOS, SOS};

/// Split formatted records into caption and image tables.
///
/// Each caption is tokenized and wrapped by `<SOS>` and `<EOS>`. Every token,
/// the markers included, is counted into `counter`. Pre-tokenized captions
/// are preferred when a record has them. Records without captions still
/// produce an image entry.
pub fn create_captions(
    records: &[FormattedRecord],
    tokenizer: &Tokenizer,
    counter: &mut WordCounter,
) -> Result<DatasetFile> {
    let mut captions = vec![];
    let mut images = Vec::with_capacity(records.len());

    for (img_idx, record) in records.iter().enumerate() {
        let sentences = record
            .tokenized_captions
            .as_ref()
            .unwrap_or(&record.captions);

        for sentence in sentences {
            let tokens: Vec<String> = itertools::chain!(
                [SOS.to_owned()],
                tokenizer.tokenize(sentence)?,
                [EOS.to_owned()]
            )
            .collect();
            counter.update(&tokens);

            captions.push(CaptionRecord {
                caption_idx: captions.len(),
                img_idx,
                caption: Caption::Tokens(tokens),
            });
        }

        images.push(ImageRecord {
            file_path: record.file_path.clone(),
            img_idx,
        });
    }

    info!(
        "created {} captions for {} images",
        captions.len(),
        images.len()
    );

    Ok(DatasetFile { images, captions })
}

/// Replace caption tokens with vocabulary ids.
pub fn encode_captions(dataset: DatasetFile, vocab: &Vocabulary) -> DatasetFile {
    let DatasetFile { images, captions } = dataset;
    let captions = captions
        .into_iter()
        .map(|record| CaptionRecord {
            caption: Caption::Ids(record.caption.to_ids(vocab)),
            ..record
        })
        .collect();
    DatasetFile { images, captions }
}
