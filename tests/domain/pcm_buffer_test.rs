use voxbridge::domain::PcmBuffer;

#[test]
fn given_two_second_duration_when_building_then_chunk_is_64000_bytes() {
    assert_eq!(PcmBuffer::for_duration(2.0).chunk_bytes(), 64_000);
}

#[test]
fn given_odd_chunk_size_when_building_then_rounded_to_whole_samples() {
    assert_eq!(PcmBuffer::new(7).chunk_bytes(), 6);
    assert_eq!(PcmBuffer::new(0).chunk_bytes(), 2);
}

#[test]
fn given_frames_smaller_than_chunk_when_pushing_then_held_until_full() {
    let mut buffer = PcmBuffer::new(8);

    assert!(buffer.push(&[1, 2, 3]).is_empty());
    assert!(buffer.push(&[4, 5, 6, 7]).is_empty());
    let chunks = buffer.push(&[8, 9, 10]);

    assert_eq!(chunks, vec![vec![1, 2, 3, 4, 5, 6, 7, 8]]);
    assert_eq!(buffer.pending_bytes(), 2);
}

#[test]
fn given_frame_spanning_several_chunks_when_pushing_then_all_cut_in_order() {
    let mut buffer = PcmBuffer::new(4);

    let chunks = buffer.push(&(0u8..10).collect::<Vec<_>>());

    assert_eq!(chunks, vec![vec![0, 1, 2, 3], vec![4, 5, 6, 7]]);
    assert_eq!(buffer.pending_bytes(), 2);
}

#[test]
fn given_dangling_odd_byte_when_flushing_then_only_whole_samples_returned() {
    let mut buffer = PcmBuffer::new(64);
    buffer.push(&[1, 2, 3, 4, 5]);

    assert_eq!(buffer.flush(), Some(vec![1, 2, 3, 4]));
    assert_eq!(buffer.pending_bytes(), 0);
    assert_eq!(buffer.flush(), None);
}

#[test]
fn given_single_byte_when_flushing_then_nothing_to_transcribe() {
    let mut buffer = PcmBuffer::new(64);
    buffer.push(&[9]);

    assert_eq!(buffer.flush(), None);
}
